//! User preference storage.
//!
//! The resolver list and the active selection live under two named keys in
//! a flat string key/value store, mirroring the platform's user defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// Key holding the encoded resolver list.
pub const DEFAULT_SERVERS_KEY: &str = "servers";

/// Key holding the active resolver's id.
pub const DEFAULT_ACTIVE_KEY: &str = "usedID";

/// Names of the two persisted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceKeys {
    pub servers: String,
    pub active: String,
}

impl PreferenceKeys {
    #[must_use]
    pub fn new(servers: impl Into<String>, active: impl Into<String>) -> Self {
        Self {
            servers: servers.into(),
            active: active.into(),
        }
    }
}

impl Default for PreferenceKeys {
    fn default() -> Self {
        Self::new(DEFAULT_SERVERS_KEY, DEFAULT_ACTIVE_KEY)
    }
}

/// Process-wide, user-scoped string preferences.
pub trait PreferenceStore: Send + Sync {
    /// Returns the value under `key`, or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an unset key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Preferences held in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Preferences stored as one JSON object in a file.
///
/// Every write replaces the file atomically (temporary file + rename), so a
/// crash mid-write leaves the previous contents intact.
///
/// # Example
///
/// ```rust,ignore
/// use dnsecure::{FileStore, PreferenceStore};
///
/// let store = FileStore::new("/var/lib/dnsecure/preferences.json");
/// store.set("usedID", "6F9619FF-8B86-D011-B42D-00CF4FC964FF")?;
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), keys = values.len(), "Wrote preferences");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        f(&mut values);
        self.write_all(&values)
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys() {
        let keys = PreferenceKeys::default();
        assert_eq!(keys.servers, "servers");
        assert_eq!(keys.active, "usedID");
    }

    #[test]
    fn memory_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn file_missing_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.get("servers").unwrap(), None);
    }

    #[test]
    fn file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        FileStore::new(&path).set("servers", "[]").unwrap();
        FileStore::new(&path).set("usedID", "abc").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("servers").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("usedID").unwrap().as_deref(), Some("abc"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn file_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("prefs.json"));
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn file_corrupt_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileStore::new(&path).get("servers").is_err());
    }
}
