//! Site configuration loading from config.toml
//!
//! Every section carries serde defaults, so a missing section (or an entirely
//! empty file) yields a working configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Admin table defaults
    #[serde(default)]
    pub table: TableDefaults,
    /// Sponsor banner rotation settings
    #[serde(default)]
    pub sponsors: SponsorSettings,
    /// Consent persistence settings
    #[serde(default)]
    pub consent: ConsentSettings,
    /// CMS content models included in exports
    #[serde(default = "default_content_models")]
    pub content_models: Vec<String>,
}

/// Defaults for the admin table pipeline
#[derive(Debug, Deserialize, Clone)]
pub struct TableDefaults {
    /// Rows per page when a screen does not override it
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum number of entries fetched from the CMS for client-side paging
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

/// Sponsor rotation settings
#[derive(Debug, Deserialize, Clone)]
pub struct SponsorSettings {
    /// Seconds between banner rotations
    #[serde(default = "default_rotation_secs")]
    pub rotation_secs: u64,
    /// Fraction of the banner that must be visible to count an impression
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
}

/// Where the file-backed consent storage lives
#[derive(Debug, Deserialize, Clone)]
pub struct ConsentSettings {
    /// Path of the JSON file holding the two consent keys
    #[serde(default = "default_consent_path")]
    pub storage_path: String,
}

const fn default_page_size() -> usize {
    10
}

const fn default_fetch_limit() -> u32 {
    100
}

const fn default_rotation_secs() -> u64 {
    5
}

const fn default_visibility_threshold() -> f64 {
    0.5
}

fn default_consent_path() -> String {
    "data/consent.json".to_string()
}

fn default_content_models() -> Vec<String> {
    ["activiteit", "nieuws", "faq", "sponsor", "page"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            table: TableDefaults::default(),
            sponsors: SponsorSettings::default(),
            consent: ConsentSettings::default(),
            content_models: default_content_models(),
        }
    }
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl Default for SponsorSettings {
    fn default() -> Self {
        Self {
            rotation_secs: default_rotation_secs(),
            visibility_threshold: default_visibility_threshold(),
        }
    }
}

impl SponsorSettings {
    /// Time between banner rotations.
    #[must_use]
    pub const fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_secs)
    }
}

impl Default for ConsentSettings {
    fn default() -> Self {
        Self {
            storage_path: default_consent_path(),
        }
    }
}

/// Loads site configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range (zero page size or rotation interval)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses and checks configuration text.
pub fn parse_config(contents: &str) -> Result<SiteConfig> {
    let config: SiteConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.table.page_size == 0 {
        return Err(Error::Config {
            message: "table.page_size must be at least 1".to_string(),
        });
    }
    if config.sponsors.rotation_secs == 0 {
        return Err(Error::Config {
            message: "sponsors.rotation_secs must be at least 1".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&config.sponsors.visibility_threshold) {
        return Err(Error::Config {
            message: "sponsors.visibility_threshold must be between 0 and 1".to_string(),
        });
    }

    Ok(config)
}

/// Loads the configuration named by `OUDERRAAD_CONFIG`, falling back to
/// `./config.toml`. A missing default file yields the built-in defaults.
pub fn load_default_config() -> Result<SiteConfig> {
    match std::env::var("OUDERRAAD_CONFIG") {
        Ok(path) => load_config(path),
        Err(_) if Path::new("config.toml").exists() => load_config("config.toml"),
        Err(_) => {
            tracing::info!("No config.toml found, using built-in defaults.");
            Ok(SiteConfig::default())
        }
    }
}
