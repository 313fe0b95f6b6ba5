//! User entity - Admin dashboard accounts.
//!
//! Each user has a unique email, a display name and a role that decides which
//! admin screens they may mutate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, stored lower-cased
    #[sea_orm(unique)]
    pub email: String,
    /// Display name shown in the dashboard
    pub name: String,
    /// One of `"admin"`, `"editor"` or `"viewer"`
    pub role: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
