//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities back the admin screens: users, the audit log, sponsor analytics
//! events and contact-form submissions.

pub mod audit_log;
pub mod sponsor_event;
pub mod submission;
pub mod user;

// Re-export specific types to avoid conflicts
pub use audit_log::{Column as AuditLogColumn, Entity as AuditLog, Model as AuditLogModel};
pub use sponsor_event::{
    Column as SponsorEventColumn, Entity as SponsorEvent, Model as SponsorEventModel,
};
pub use submission::{Column as SubmissionColumn, Entity as Submission, Model as SubmissionModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
