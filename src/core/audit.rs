//! Audit log business logic.
//!
//! Every admin mutation that goes through this crate appends one entry. Entries
//! are never updated or deleted.

use crate::{
    entities::{AuditLog, audit_log},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::fmt;
use tracing::debug;

/// Kinds of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// An entity was created
    Create,
    /// An entity was changed
    Update,
    /// An entity was removed
    Delete,
    /// Content was imported from an export file
    Import,
    /// Content was exported
    Export,
}

impl AuditAction {
    /// Stored verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends an audit entry. Works inside a transaction.
pub async fn record<C>(
    db: &C,
    actor: &str,
    action: AuditAction,
    entity_type: &str,
    entity_id: &str,
    details: Option<String>,
) -> Result<audit_log::Model>
where
    C: ConnectionTrait,
{
    debug!("Audit: {} {} {}/{}", actor, action, entity_type, entity_id);
    let entry = audit_log::ActiveModel {
        actor: Set(actor.to_string()),
        action: Set(action.as_str().to_string()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id.to_string()),
        details: Set(details),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Most recent entries first, at most `limit`.
pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<audit_log::Model>> {
    AuditLog::find()
        .order_by_desc(audit_log::Column::CreatedAt)
        .order_by_desc(audit_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// History of one entity, oldest first.
pub async fn list_for_entity(
    db: &DatabaseConnection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<audit_log::Model>> {
    AuditLog::find()
        .filter(audit_log::Column::EntityType.eq(entity_type))
        .filter(audit_log::Column::EntityId.eq(entity_id))
        .order_by_asc(audit_log::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_record_and_list_recent() -> Result<()> {
        let db = setup_test_db().await?;
        record(&db, "bestuur@ouderraad.nl", AuditAction::Create, "user", "1", None).await?;
        record(
            &db,
            "bestuur@ouderraad.nl",
            AuditAction::Update,
            "user",
            "1",
            Some(r#"{"role":"editor"}"#.to_string()),
        )
        .await?;
        record(&db, "system", AuditAction::Import, "faq", "*", None).await?;

        let recent = list_recent(&db, 2).await?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "import");
        assert_eq!(recent[1].action, "update");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_for_entity() -> Result<()> {
        let db = setup_test_db().await?;
        record(&db, "a", AuditAction::Create, "user", "1", None).await?;
        record(&db, "a", AuditAction::Create, "user", "2", None).await?;
        record(&db, "a", AuditAction::Delete, "user", "1", None).await?;

        let history = list_for_entity(&db, "user", "1").await?;
        let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["create", "delete"]);
        Ok(())
    }
}
