//! Key-Value Persistence
//!
//! The app persists exactly two values: the user profile (JSON) and the
//! theme (`"light"` / `"dark"`). Both go through the [`KeyValueStore`]
//! trait, which has no transactional guarantees.
//!
//! - [`MemoryStore`]: in-process map, used by tests and ephemeral runs
//! - [`FileStore`]: a single JSON object on disk under the data directory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::profile::UserProfile;

/// Key holding the serialized [`UserProfile`]
pub const PROFILE_KEY: &str = "userProfile";

/// Key holding the persisted theme
pub const THEME_KEY: &str = "theme";

/// Opaque string get/set keyed by a fixed name
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value (no-op when absent)
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// File-backed store
///
/// All entries live in one JSON object (`{"userProfile": "...", "theme": "dark"}`).
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// File name inside the data directory
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open (lazily) the store file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store inside a data directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(write_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        // A corrupt file is replaced rather than blocking every future write
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable store contents");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        tracing::debug!(key = key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Load the saved profile
///
/// Fails open: an unreadable store, invalid JSON, a wrong shape, or a
/// profile with blank fields are all treated as "no profile", which routes
/// the app back to onboarding.
pub fn load_profile(store: &dyn KeyValueStore) -> Option<UserProfile> {
    let raw = match store.get(PROFILE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Profile store unreadable, starting onboarding");
            return None;
        }
    };

    match serde_json::from_str::<UserProfile>(&raw) {
        Ok(profile) if profile.is_complete() => Some(profile),
        Ok(profile) => {
            tracing::warn!(
                missing = ?profile.first_missing(),
                "Stored profile incomplete, starting onboarding"
            );
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored profile malformed, starting onboarding");
            None
        }
    }
}

/// Persist the profile as JSON
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn save_profile(store: &dyn KeyValueStore, profile: &UserProfile) -> Result<(), StoreError> {
    let json = serde_json::to_string(profile).map_err(|e| StoreError::Corrupt {
        path: PathBuf::from(PROFILE_KEY),
        source: e,
    })?;
    store.set(PROFILE_KEY, &json)?;
    tracing::info!(name = %profile.name, "Profile saved");
    Ok(())
}

/// Forget the saved profile so the next launch onboards again
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_profile(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(PROFILE_KEY)?;
    tracing::info!("Saved profile removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        store.remove(THEME_KEY).unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set(THEME_KEY, "dark").unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_clear_profile_keeps_theme() {
        let store = MemoryStore::with_entries([(PROFILE_KEY, "{}"), (THEME_KEY, "dark")]);
        clear_profile(&store).unwrap();

        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert!(load_profile(&store).is_none());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path().join("nested"));
        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_is_error_on_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.get(PROFILE_KEY),
            Err(StoreError::Corrupt { .. })
        ));

        // Writing recovers the file
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_profile_roundtrip() {
        let store = MemoryStore::new();
        let profile = UserProfile::new("Priya", "biology", "math", "curious");
        save_profile(&store, &profile).unwrap();
        assert_eq!(load_profile(&store), Some(profile));
    }

    #[test]
    fn test_malformed_profile_fails_open() {
        let store = MemoryStore::with_entries([(PROFILE_KEY, "{not valid json")]);
        assert_eq!(load_profile(&store), None);
    }

    #[test]
    fn test_wrong_shape_profile_fails_open() {
        let store = MemoryStore::with_entries([(PROFILE_KEY, r#"{"name":"Priya"}"#)]);
        assert_eq!(load_profile(&store), None);

        let store = MemoryStore::with_entries([(PROFILE_KEY, "[1,2,3]")]);
        assert_eq!(load_profile(&store), None);
    }

    #[test]
    fn test_blank_profile_fails_open() {
        let store = MemoryStore::with_entries([(
            PROFILE_KEY,
            r#"{"name":"","interests":"a","skills":"b","personality":"c"}"#,
        )]);
        assert_eq!(load_profile(&store), None);
    }

    #[test]
    fn test_unreadable_file_store_fails_open() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "{{{").unwrap();
        assert_eq!(load_profile(&store), None);
    }
}
