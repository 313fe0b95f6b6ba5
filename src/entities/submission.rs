//! Submission entity - Messages sent through the public contact form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contact form submission database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Optional subject line
    pub subject: Option<String>,
    /// Message body
    pub message: String,
    /// Whether an admin has handled the message
    pub handled: bool,
    /// When the form was submitted
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
