//! Contact form validation and submission storage.
//!
//! Validation reports every offending field at once so the form can show each
//! message next to its input; one bad field never hides the others.

use crate::{
    entities::{Submission, submission},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_NAME_CHARS: usize = 200;

/// Raw form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    /// Sender name
    #[serde(default)]
    pub name: String,
    /// Sender email
    #[serde(default)]
    pub email: String,
    /// Optional subject
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body
    #[serde(default)]
    pub message: String,
}

/// A validation message for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name
    pub field: &'static str,
    /// Message shown next to the field
    pub message: String,
}

/// Form input that passed validation, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
}

/// Minimal structural email check: one `@`, non-empty local part, a dot in the
/// domain that is neither first nor last, no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .rfind('.')
            .is_some_and(|dot| dot > 0 && dot < domain.len() - 1)
}

impl ContactForm {
    /// Checks every field.
    ///
    /// # Errors
    /// Returns one [`FieldError`] per invalid field.
    pub fn validate(&self) -> std::result::Result<ValidContact, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "Naam is verplicht".to_string(),
            });
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.push(FieldError {
                field: "name",
                message: format!("Naam mag maximaal {MAX_NAME_CHARS} tekens zijn"),
            });
        }

        if email.is_empty() {
            errors.push(FieldError {
                field: "email",
                message: "E-mailadres is verplicht".to_string(),
            });
        } else if !is_valid_email(email) {
            errors.push(FieldError {
                field: "email",
                message: "Voer een geldig e-mailadres in".to_string(),
            });
        }

        if message.is_empty() {
            errors.push(FieldError {
                field: "message",
                message: "Bericht is verplicht".to_string(),
            });
        } else if message.chars().count() > MAX_MESSAGE_CHARS {
            errors.push(FieldError {
                field: "message",
                message: format!("Bericht mag maximaal {MAX_MESSAGE_CHARS} tekens zijn"),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidContact {
            name: name.to_string(),
            email: email.to_lowercase(),
            subject: self
                .subject
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            message: message.to_string(),
        })
    }
}

/// Stores a validated submission.
#[instrument(skip(db, contact), fields(email = %contact.email))]
pub async fn submit(db: &DatabaseConnection, contact: ValidContact) -> Result<submission::Model> {
    let row = submission::ActiveModel {
        name: Set(contact.name),
        email: Set(contact.email),
        subject: Set(contact.subject),
        message: Set(contact.message),
        handled: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let saved = row.insert(db).await?;
    info!("Stored contact submission {}", saved.id);
    Ok(saved)
}

/// All submissions, newest first.
pub async fn list_submissions(db: &DatabaseConnection) -> Result<Vec<submission::Model>> {
    Submission::find()
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a submission as handled.
pub async fn mark_handled(db: &DatabaseConnection, id: i64) -> Result<submission::Model> {
    let existing = Submission::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("submission", id))?;
    let mut active: submission::ActiveModel = existing.into();
    active.handled = Set(true);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ouder@school.nl"));
        assert!(is_valid_email("a.b+c@sub.school.nl"));
        assert!(!is_valid_email("ouder"));
        assert!(!is_valid_email("@school.nl"));
        assert!(!is_valid_email("ouder@school"));
        assert!(!is_valid_email("ouder@school."));
        assert!(!is_valid_email("ouder@.nl"));
        assert!(!is_valid_email("ou der@school.nl"));
        assert!(!is_valid_email("a@b@school.nl"));
    }

    #[test]
    fn test_all_field_errors_reported_together() {
        let errors = form("  ", "not-an-email", "").validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
    }

    #[test]
    fn test_one_bad_field_does_not_hide_valid_ones() {
        let errors = form("Jan", "jan@", "Hallo").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn test_overlong_message_rejected() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let errors = form("Jan", "jan@school.nl", &long).validate().unwrap_err();
        assert_eq!(errors[0].field, "message");
    }

    #[tokio::test]
    async fn test_submit_and_mark_handled() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = form(" Jan ", "Jan@School.NL", "Wanneer is de kerstmarkt?");
        input.subject = Some("   ".to_string());
        let valid = input.validate().unwrap();

        let saved = submit(&db, valid).await?;
        assert_eq!(saved.name, "Jan");
        assert_eq!(saved.email, "jan@school.nl");
        assert!(saved.subject.is_none());
        assert!(!saved.handled);

        let handled = mark_handled(&db, saved.id).await?;
        assert!(handled.handled);
        assert_eq!(list_submissions(&db).await?.len(), 1);

        assert!(matches!(
            mark_handled(&db, 999).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
