//! Durable slot remembering that this visitor already registered.
//!
//! One named key holding one opaque lead identifier. The controller only
//! ever reads it at startup and writes it after a create or verify succeeds.

use crate::errors::AppError;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Name of the slot holding the remembered identifier.
pub const IDENTIFIER_KEY: &str = "cuidarte_uid";

pub trait IdentifierStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, identifier: &str) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

/// Process-local slot. Also backs the per-session cookie on the HTTP surface.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentifierStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryIdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(identifier.into()))),
        }
    }
}

impl IdentifierStore for MemoryIdentifierStore {
    fn get(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, identifier: &str) -> Result<(), AppError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(identifier.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// JSON file of key/value slots, surviving process restarts.
///
/// Other keys in the file are preserved; only [`IDENTIFIER_KEY`] is touched.
#[derive(Debug, Clone)]
pub struct FileIdentifierStore {
    path: PathBuf,
}

impl FileIdentifierStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_slots(&self) -> Result<Map<String, Value>, AppError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => Ok(map),
                _ => Err(AppError::InternalError(format!(
                    "Identifier store {} is not a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_slots(&self, slots: &Map<String, Value>) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(slots)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl IdentifierStore for FileIdentifierStore {
    fn get(&self) -> Option<String> {
        match self.read_slots() {
            Ok(slots) => slots
                .get(IDENTIFIER_KEY)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::warn!("Ignoring unreadable identifier store: {}", e);
                None
            }
        }
    }

    fn set(&self, identifier: &str) -> Result<(), AppError> {
        let mut slots = self.read_slots()?;
        slots.insert(
            IDENTIFIER_KEY.to_string(),
            Value::String(identifier.to_string()),
        );
        self.write_slots(&slots)
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut slots = self.read_slots()?;
        if slots.remove(IDENTIFIER_KEY).is_none() {
            return Ok(());
        }
        self.write_slots(&slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryIdentifierStore::new();
        assert_eq!(store.get(), None);

        store.set("xyz").unwrap();
        assert_eq!(store.get().as_deref(), Some("xyz"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_memory_store_clones_share_slot() {
        let store = MemoryIdentifierStore::new();
        let view = store.clone();
        store.set("abc").unwrap();
        assert_eq!(view.get().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = temp_path("uid-reopen");
        FileIdentifierStore::new(&path).set("lead-1").unwrap();

        let reopened = FileIdentifierStore::new(&path);
        assert_eq!(reopened.get().as_deref(), Some("lead-1"));

        reopened.clear().unwrap();
        assert_eq!(FileIdentifierStore::new(&path).get(), None);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let path = temp_path("uid-keys");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileIdentifierStore::new(&path);
        store.set("lead-2").unwrap();
        store.clear().unwrap();

        let content: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["theme"], "dark");
        assert!(content.get(IDENTIFIER_KEY).is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_file_store_refuses_to_overwrite_corrupt_file() {
        let path = temp_path("uid-corrupt");
        let corrupt = r#"{"theme":"dark","#;
        std::fs::write(&path, corrupt).unwrap();

        let store = FileIdentifierStore::new(&path);
        assert_eq!(store.get(), None);
        assert!(store.set("lead-9").is_err());
        assert!(store.clear().is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), corrupt);

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(store.set("lead-9").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2]");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let store = FileIdentifierStore::new(temp_path("uid-missing"));
        assert_eq!(store.get(), None);
        assert!(store.clear().is_ok());
    }
}
