/*
[INPUT]:  Storage keys and serialized session payloads
[OUTPUT]: Pluggable key-value persistence backends
[POS]:    Session layer - storage capability abstraction
[UPDATE]: When adding new backends or changing the adapter contract
*/

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Key-value capability the session store writes through
///
/// Implement this to bring your own persistence (keychain, database row,
/// app preferences). Adapters are fire-and-forget on write: a backend that
/// cannot persist should log and degrade to absent reads.
pub trait StorageAdapter: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str);

    /// Remove the value stored under `key`; no-op when absent
    fn remove(&self, key: &str);
}

/// Default adapter for environments without an ambient storage slot
///
/// Reads always come back absent, so sessions live only in process memory.
/// Callers needing persistence must inject another adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

impl StorageAdapter for NoopStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

/// In-memory adapter; shared across clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.slots.write().unwrap().remove(key);
    }
}

/// File-backed adapter: one file per storage key in a directory
///
/// Files are written with mode 0600. Write failures are logged and the
/// slot reads back as absent.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create an adapter rooted at the given directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.session"))
    }
}

impl StorageAdapter for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if !self.dir.exists() {
            if let Err(err) = fs::create_dir_all(&self.dir) {
                tracing::warn!("failed to create session directory: {err}");
                return;
            }
        }

        let path = self.slot_path(key);
        if let Err(err) = fs::write(&path, value) {
            tracing::warn!("failed to persist session: {err}");
            return;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            let _ = fs::set_permissions(&path, perms);
        }
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.slot_path(key));
    }
}
