use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Context, Result};

/// Persists the OAuth bearer token between runs.
pub trait TokenStore: Send + Sync + Clone + 'static {
    fn token(&self) -> Result<Option<String>>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Result<Option<String>> {
        Ok(self.token.lock()?.clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        self.token.lock()?.take();
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// Keeps the token in a small JSON file, `{"access_token": "..."}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("reading token file")?;
        let stored: StoredToken =
            serde_json::from_str(&content).context("token file is malformed")?;
        Ok(Some(stored.access_token))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            access_token: token.to_string(),
        };
        fs::write(&self.path, serde_json::to_string(&stored)?)?;
        info!("token saved to {}", self.path.display());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            debug!("token file {} removed", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token().unwrap(), None);
        store.set_token("abc").unwrap();
        assert_eq!(store.clone().token().unwrap().as_deref(), Some("abc"));
        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/token.json");

        let store = FileTokenStore::new(&path);
        assert_eq!(store.token().unwrap(), None);
        store.set_token("bearer-1").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.token().unwrap().as_deref(), Some("bearer-1"));

        reopened.clear_token().unwrap();
        assert!(!path.exists());
        assert_eq!(store.token().unwrap(), None);
        // clearing twice is fine
        store.clear_token().unwrap();
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "garbage").unwrap();

        assert!(FileTokenStore::new(&path).token().is_err());
    }
}
