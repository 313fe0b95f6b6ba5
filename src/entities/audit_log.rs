//! Audit log entity - Append-only record of admin mutations.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Email (or system name) of whoever performed the action
    pub actor: String,
    /// Action verb, e.g. `"create"`, `"update"`, `"delete"`, `"import"`
    pub action: String,
    /// Kind of entity touched (`"user"`, `"activiteit"`, ...)
    pub entity_type: String,
    /// Identifier of the touched entity
    pub entity_id: String,
    /// Free-form details, usually JSON
    pub details: Option<String>,
    /// When the action happened
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
