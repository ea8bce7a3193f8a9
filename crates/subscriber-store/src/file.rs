//! JSON file backend.
//!
//! File shape: `{"subscribers": ["..."], "updated_at": "2026-01-01T12:00:00"}`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{StoreError, SubscriberStore};

#[derive(Debug, Serialize, Deserialize)]
struct SubscriberFile {
    #[serde(default)]
    subscribers: Vec<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Stores subscribers in a single JSON document, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SubscriberStore for JsonFileStore {
    /// A missing file is an empty set. A malformed file is logged and treated
    /// as empty so a corrupt document never keeps the agent from starting.
    fn load(&self) -> Result<Vec<String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<SubscriberFile>(&raw) {
            Ok(file) => Ok(file.subscribers),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring malformed subscriber file: {e}");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, subscribers: &[String]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let doc = SubscriberFile {
            subscribers: subscribers.to_vec(),
            updated_at: Some(
                chrono::Local::now()
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
            ),
        };
        let body = serde_json::to_string_pretty(&doc)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("subscribers.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_writes_document_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("subscribers.json");
        let store = JsonFileStore::new(&path);

        store.save(&["1".to_string(), "2".to_string()]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["subscribers"], serde_json::json!(["1", "2"]));
        let stamp = raw["updated_at"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S").is_ok());
        assert_eq!(store.load().unwrap(), vec!["1", "2"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn document_without_timestamp_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        fs::write(&path, r#"{"subscribers":["42"]}"#).unwrap();
        assert_eq!(JsonFileStore::new(&path).load().unwrap(), vec!["42"]);
    }
}
