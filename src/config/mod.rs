/// Database configuration and connection management
pub mod database;

/// Site settings loaded from config.toml
pub mod site;

/// CMS and admin API settings from environment variables
pub mod cms;
