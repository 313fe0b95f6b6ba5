//! Durable storage for consent keys.
//!
//! Stores hold plain string values under string keys, like browser local
//! storage. The consent store only ever touches `cookie-consent` and
//! `cookie-preferences`.

use crate::config::site::ConsentSettings;
use crate::errors::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// String key-value storage that survives the session.
pub trait ConsentStorage {
    /// Reads the value stored under `key`, `Ok(None)` if absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage, used for server-side contexts and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with the given entries.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ConsentStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a single JSON object file.
///
/// Writes go to a sibling temp file that is then renamed over the original, so
/// a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the configured consent file.
    #[must_use]
    pub fn from_settings(settings: &ConsentSettings) -> Self {
        Self::new(&settings.storage_path)
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| Error::Storage {
                message: format!("{} is not a storage file: {e}", self.path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ConsentStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.load()?;
        trace!("Read key '{}' from {}", key, self.path.display());
        Ok(entries.remove(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote key '{}' to {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_memory_storage_overwrites() -> Result<()> {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.read("k")?, None);
        storage.write("k", "one")?;
        storage.write("k", "two")?;
        assert_eq!(storage.read("k")?, Some("two".to_string()));
        Ok(())
    }

    #[test]
    fn test_file_storage_persists_across_instances() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("consent.json");

        let mut first = FileStorage::new(&path);
        assert_eq!(first.read("cookie-consent")?, None);
        first.write("cookie-consent", "accepted")?;
        first.write("cookie-preferences", r#"{"analytics":true}"#)?;

        let second = FileStorage::new(&path);
        assert_eq!(second.read("cookie-consent")?, Some("accepted".to_string()));
        assert_eq!(
            second.read("cookie-preferences")?,
            Some(r#"{"analytics":true}"#.to_string())
        );
        Ok(())
    }

    #[test]
    fn test_file_storage_at_configured_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("consent.json");
        let settings = ConsentSettings {
            storage_path: path.to_string_lossy().into_owned(),
        };

        let mut storage = FileStorage::from_settings(&settings);
        assert_eq!(storage.path(), path.as_path());
        storage.write("cookie-consent", "rejected")?;
        assert_eq!(
            FileStorage::new(&path).read("cookie-consent")?,
            Some("rejected".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_file_storage_rejects_garbage_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("consent.json");
        fs::write(&path, "garbage")?;

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.read("cookie-consent"),
            Err(Error::Storage { .. })
        ));
        Ok(())
    }
}
