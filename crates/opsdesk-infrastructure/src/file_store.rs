//! TOML-file-backed key-value store.
//!
//! The shipped implementation of the [`KeyValueStore`] capability: a
//! single TOML document holding every key. Writes go through a temporary
//! file, fsync, and an atomic rename; updates take an exclusive file lock
//! so two console processes cannot interleave a load-modify-save.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use opsdesk_core::store::KeyValueStore;

/// On-disk shape: one table of entries, keyed by store key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    entries: BTreeMap<String, toml::Value>,
}

/// A `KeyValueStore` persisted as a TOML document.
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    /// Creates a store handle for the given file. The file is created on
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform-default location.
    pub fn at_default_location() -> Result<Self> {
        let paths = crate::paths::ConsolePaths::default();
        Ok(Self::new(paths.store_file()?))
    }

    /// Loads the document. A missing or empty file is an empty store.
    fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Saves the document atomically: tmp file in the same directory,
    /// fsync, rename.
    fn save(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let toml_string = toml::to_string_pretty(document)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), "console state saved");
        Ok(())
    }

    /// Load-modify-save under an exclusive lock.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut StoreDocument),
    {
        let _lock = FileLock::acquire(&self.path)?;
        let mut document = self.load()?;
        f(&mut document);
        self.save(&document)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .context("store path has no parent directory")?;
        let file_name = self.path.file_name().context("store path has no file name")?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

#[async_trait]
impl KeyValueStore for TomlFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let document = self.load()?;
        match document.entries.get(key) {
            Some(value) => Ok(Some(serde_json::to_value(value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let value = toml::Value::try_from(value)
            .with_context(|| format!("value under '{key}' is not representable as TOML"))?;
        self.update(|document| {
            document.entries.insert(key.to_string(), value);
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|document| {
            document.entries.remove(key);
        })
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .with_context(|| format!("failed to lock {}", lock_path.display()))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped; removing
        // the lock file is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get_survive_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console_state.toml");

        let store = TomlFileStore::new(&path);
        store
            .set("response_templates", json!([{"id": "1", "title": "Hi", "content": "Hello"}]))
            .await
            .unwrap();

        // A fresh handle reads what the first one wrote.
        let reopened = TomlFileStore::new(&path);
        let value = reopened.get("response_templates").await.unwrap().unwrap();
        assert_eq!(value[0]["title"], "Hi");
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlFileStore::new(temp_dir.path().join("nothing.toml"));
        assert!(store.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console_state.toml");
        let store = TomlFileStore::new(&path);

        store.set("k", json!("v")).await.unwrap();
        store.remove("k").await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
        assert!(TomlFileStore::new(&path).get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_tmp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console_state.toml");
        let store = TomlFileStore::new(&path);

        store.set("k", json!({"n": 42})).await.unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".console_state.toml.tmp").exists());
    }
}
