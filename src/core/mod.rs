//! Core site logic, independent of any web framework.

/// Audit log recording and listing
pub mod audit;

/// CMS content and admin API clients
pub mod cms;

/// Cookie consent store and banner
pub mod consent;

/// Contact form validation and submissions
pub mod contact;

/// FAQ accordion state
pub mod faq;

/// Component registry for CMS page blocks
pub mod registry;

/// Sponsor banner rotation and analytics
pub mod sponsors;

/// Admin table filter / sort / paginate pipeline
pub mod table;

/// Content export and import
pub mod transfer;

/// Admin user management
pub mod users;
