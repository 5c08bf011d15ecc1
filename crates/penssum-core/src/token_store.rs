//! Persisted key-value store
//!
//! A small JSON map on disk, used to remember the last push token that
//! was registered with the service so later launches skip registration.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::models::PushToken;

/// Key holding the registered push token
pub const TOKEN_KEY: &str = "@token";

/// Where the registered push token is remembered
pub trait TokenStore: Send + Sync {
    fn load_token(&self) -> Result<Option<PushToken>>;
    fn save_token(&self, token: &PushToken) -> Result<()>;
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(SyncError::Storage {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&json).map_err(|e| SyncError::CorruptStore {
            path: self.path.clone(),
            details: e.to_string(),
        })
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        let storage_err = |source| SyncError::Storage {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| SyncError::CorruptStore {
            path: self.path.clone(),
            details: e.to_string(),
        })?;

        // Atomic replace: write sibling, then rename
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(storage_err)?;
        fs::rename(&tmp, &self.path).map_err(storage_err)?;
        debug!("Saved token store {:?}", self.path);
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load_token(&self) -> Result<Option<PushToken>> {
        Ok(self.get(TOKEN_KEY)?.map(PushToken::new))
    }

    fn save_token(&self, token: &PushToken) -> Result<()> {
        self.set(TOKEN_KEY, token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("storage.json"));
        assert!(store.load_token().unwrap().is_none());
    }

    #[test]
    fn test_token_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        {
            let store = FileTokenStore::new(&path);
            store.save_token(&PushToken::new("tok-1")).unwrap();
        }

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.load_token().unwrap(),
            Some(PushToken::new("tok-1"))
        );
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_other_keys_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("storage.json"));

        store.set("@theme", "dark").unwrap();
        store.save_token(&PushToken::new("tok-2")).unwrap();

        assert_eq!(store.get("@theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.load_token().unwrap(), Some(PushToken::new("tok-2")));
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(
            store.load_token(),
            Err(SyncError::CorruptStore { .. })
        ));
    }
}
