//! Sponsor event entity - One row per recorded impression or click on a
//! sponsor banner. Aggregated into per-sponsor analytics on read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sponsor event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sponsor_events")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// CMS id of the sponsor
    pub sponsor_id: String,
    /// Sponsor name at the time of the event
    pub sponsor_name: String,
    /// `"impression"` or `"click"`
    pub event_type: String,
    /// Page path the banner was shown on
    pub page: Option<String>,
    /// When the event was recorded
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
