//! Admin user management.
//!
//! Create, list, change role and delete dashboard users. Every mutation writes
//! an audit entry in the same database transaction as the change itself.

use crate::{
    core::audit::{self, AuditAction},
    core::contact::is_valid_email,
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

/// Dashboard permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full access including user management
    Admin,
    /// May edit content
    Editor,
    /// Read-only
    Viewer,
}

impl Role {
    /// Stored role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role may mutate content.
    #[must_use]
    pub const fn can_edit(self) -> bool {
        matches!(self, Self::Admin | Self::Editor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(Error::validation("role", format!("unknown role {other:?}"))),
        }
    }
}

/// All users, ordered by name.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by email (case-insensitive).
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a user after validating the email, name and uniqueness.
#[instrument(skip(db))]
pub async fn create_user(
    db: &DatabaseConnection,
    actor: &str,
    email: &str,
    name: &str,
    role: Role,
) -> Result<user::Model> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(Error::validation("email", "invalid email address"));
    }
    if name.trim().is_empty() {
        return Err(Error::validation("name", "name cannot be empty"));
    }
    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::validation("email", "a user with this email already exists"));
    }

    let txn = db.begin().await?;
    let created = user::ActiveModel {
        email: Set(email),
        name: Set(name.trim().to_string()),
        role: Set(role.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    audit::record(
        &txn,
        actor,
        AuditAction::Create,
        "user",
        &created.id.to_string(),
        Some(format!("role={role}")),
    )
    .await?;
    txn.commit().await?;

    info!("Created user {} with role {}", created.email, role);
    Ok(created)
}

/// Changes a user's role. The last admin cannot be demoted.
#[instrument(skip(db))]
pub async fn update_role(
    db: &DatabaseConnection,
    actor: &str,
    user_id: i64,
    role: Role,
) -> Result<user::Model> {
    let txn = db.begin().await?;
    let existing = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let previous = existing.role.clone();
    let mut active: user::ActiveModel = existing.into();
    active.role = Set(role.as_str().to_string());
    let updated = active.update(&txn).await?;
    if previous == Role::Admin.as_str() && role != Role::Admin {
        if let Err(e) = ensure_admin_remains(&txn).await {
            txn.rollback().await?;
            return Err(e);
        }
    }
    audit::record(
        &txn,
        actor,
        AuditAction::Update,
        "user",
        &user_id.to_string(),
        Some(format!("role {previous} -> {role}")),
    )
    .await?;
    txn.commit().await?;

    Ok(updated)
}

/// Deletes a user. The last admin cannot be deleted.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, actor: &str, user_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    User::delete_by_id(user_id).exec(&txn).await?;
    if existing.role == Role::Admin.as_str() {
        if let Err(e) = ensure_admin_remains(&txn).await {
            txn.rollback().await?;
            return Err(e);
        }
    }
    audit::record(
        &txn,
        actor,
        AuditAction::Delete,
        "user",
        &user_id.to_string(),
        Some(existing.email),
    )
    .await?;
    txn.commit().await?;

    info!("Deleted user {}", user_id);
    Ok(())
}

// Checked after the change, inside the same transaction, so concurrent
// demotions cannot both pass.
async fn ensure_admin_remains<C>(conn: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let admins = User::find()
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .count(conn)
        .await?;
    if admins == 0 {
        return Err(Error::validation("role", "at least one admin must remain"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::list_for_entity;
    use crate::test_utils::{create_test_user, setup_test_db};

    const ACTOR: &str = "bestuur@ouderraad.nl";

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_user(&db, ACTOR, "geen-email", "Piet", Role::Editor).await;
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "email"));

        let result = create_user(&db, ACTOR, "piet@school.nl", "  ", Role::Editor).await;
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "name"));

        create_user(&db, ACTOR, "piet@school.nl", "Piet", Role::Editor).await?;
        let duplicate = create_user(&db, ACTOR, "PIET@school.nl", "Piet 2", Role::Viewer).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_writes_audit_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, ACTOR, " Anna@School.nl ", "Anna", Role::Admin).await?;
        assert_eq!(user.email, "anna@school.nl");
        assert_eq!(user.role, "admin");

        let history = list_for_entity(&db, "user", &user.id.to_string()).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor, ACTOR);
        assert_eq!(history[0].action, "create");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "zoe@school.nl", "Zoë", Role::Viewer).await?;
        create_test_user(&db, "bram@school.nl", "Bram", Role::Editor).await?;

        let names: Vec<String> = list_users(&db).await?.into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Bram", "Zoë"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_last_admin_is_protected() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin@school.nl", "Admin", Role::Admin).await?;

        let demote = update_role(&db, ACTOR, admin.id, Role::Editor).await;
        assert!(matches!(demote, Err(Error::Validation { .. })));
        let delete = delete_user(&db, ACTOR, admin.id).await;
        assert!(matches!(delete, Err(Error::Validation { .. })));

        let second = create_test_user(&db, "tweede@school.nl", "Tweede", Role::Admin).await?;
        let demoted = update_role(&db, ACTOR, admin.id, Role::Editor).await?;
        assert_eq!(demoted.role, "editor");
        let delete_second = delete_user(&db, ACTOR, second.id).await;
        assert!(matches!(delete_second, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_demotions_keep_one_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_user(&db, "een@school.nl", "Een", Role::Admin).await?;
        let second = create_test_user(&db, "twee@school.nl", "Twee", Role::Admin).await?;

        let (a, b) = tokio::join!(
            update_role(&db, ACTOR, first.id, Role::Editor),
            update_role(&db, ACTOR, second.id, Role::Editor),
        );
        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);

        let admins = User::find()
            .filter(user::Column::Role.eq(Role::Admin.as_str()))
            .count(&db)
            .await?;
        assert_eq!(admins, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_demotion_is_rolled_back() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin@school.nl", "Admin", Role::Admin).await?;
        assert!(update_role(&db, ACTOR, admin.id, Role::Viewer).await.is_err());

        let reloaded = get_user_by_email(&db, "admin@school.nl").await?;
        assert_eq!(reloaded.map(|u| u.role), Some("admin".to_string()));
        let history = list_for_entity(&db, "user", &admin.id.to_string()).await?;
        assert_eq!(history.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_missing_user() -> Result<()> {
        let db = setup_test_db().await?;
        let viewer = create_test_user(&db, "kijker@school.nl", "Kijker", Role::Viewer).await?;
        delete_user(&db, ACTOR, viewer.id).await?;
        assert!(get_user_by_email(&db, "kijker@school.nl").await?.is_none());

        let history = list_for_entity(&db, "user", &viewer.id.to_string()).await?;
        assert_eq!(history.last().map(|e| e.action.as_str()), Some("delete"));

        assert!(matches!(
            delete_user(&db, ACTOR, 404).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            update_role(&db, ACTOR, 404, Role::Viewer).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_role_parsing() {
        assert!(matches!("editor".parse::<Role>(), Ok(Role::Editor)));
        assert!("owner".parse::<Role>().is_err());
        assert!(Role::Editor.can_edit());
        assert!(!Role::Viewer.can_edit());
    }
}
