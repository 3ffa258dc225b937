//! TOML-backed key-value store for persisted client state.
//!
//! Stores the identity fields as one flat TOML table. Writes are atomic
//! (tmp file + fsync + rename) and serialized through an exclusive advisory
//! lock so concurrent client processes cannot interleave partial writes.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assistant_core::{AssistantError, KeyValueStore, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

type StateTable = BTreeMap<String, String>;

/// File-backed [`KeyValueStore`] implementation.
///
/// The table is loaded once on construction and cached in memory; every
/// mutation rewrites the file atomically. Missing file reads as an empty
/// table.
pub struct TomlStateStore {
    path: PathBuf,
    cache: Arc<Mutex<StateTable>>,
}

impl TomlStateStore {
    /// Opens (or initializes) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = Self::load_table(&path)?;

        Ok(Self {
            path,
            cache: Arc::new(Mutex::new(table)),
        })
    }

    /// Opens the store at the default location:
    /// `~/.config/edms-assistant/state.toml`
    pub fn new_default() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| AssistantError::config("Could not determine home directory"))?;
        let path = home
            .join(".config")
            .join("edms-assistant")
            .join("state.toml");
        Self::new(path)
    }

    fn load_table(path: &Path) -> Result<StateTable> {
        if !path.exists() {
            return Ok(StateTable::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(StateTable::new());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Writes the table atomically: serialize, write to a sibling tmp file,
    /// fsync, rename over the target, all under an exclusive lock.
    fn save_table(path: &Path, table: &StateTable) -> Result<()> {
        let _lock = FileLock::acquire(path)?;

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(table)?;

        let tmp_path = temp_path(path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, path)?;
        debug!("state saved to {}", path.display());

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for TomlStateStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.cache.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut table = self.cache.lock().await;
        table.insert(key.to_string(), value.to_string());
        Self::save_table(&self.path, &table)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut table = self.cache.lock().await;
        if table.remove(key).is_none() {
            return Ok(());
        }
        Self::save_table(&self.path, &table)
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| AssistantError::io("Path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| AssistantError::io("Path has no file name"))?;

    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(parent.join(tmp_name))
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock next to the given path.
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                AssistantError::data_access(format!("Failed to acquire lock: {}", e))
            })?;
        }

        #[cfg(not(unix))]
        {
            // No advisory locking off Unix; acceptable for a single-user
            // desktop client.
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlStateStore::new(temp_dir.path().join("state.toml")).unwrap();

        store.set("edms_user_id", "u-1").await.unwrap();
        assert_eq!(store.get("edms_user_id").await.as_deref(), Some("u-1"));

        store.remove("edms_user_id").await.unwrap();
        assert_eq!(store.get("edms_user_id").await, None);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.toml");

        {
            let store = TomlStateStore::new(&path).unwrap();
            store.set("edms_thread_id", "t1").await.unwrap();
            store.set("edms_user_id", "u-1").await.unwrap();
        }

        let reopened = TomlStateStore::new(&path).unwrap();
        assert_eq!(reopened.get("edms_thread_id").await.as_deref(), Some("t1"));
        assert_eq!(reopened.get("edms_user_id").await.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlStateStore::new(temp_dir.path().join("absent.toml")).unwrap();

        assert_eq!(store.get("edms_user_id").await, None);
    }

    #[tokio::test]
    async fn removing_absent_key_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlStateStore::new(temp_dir.path().join("state.toml")).unwrap();

        store.remove("edms_thread_id").await.unwrap();
    }
}
