//! Reloadable registry bound to its snapshot file.

use super::{EmptyMaskPolicy, Registry};
use crate::error::RegistryError;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Owns the live [`Registry`] and the file it is persisted to.
///
/// `reload` and `clear` swap in a whole new registry. Callers fetch the
/// current one with [`RegistryStore::current`] for each operation instead of
/// holding on to it.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    empty_masks: EmptyMaskPolicy,
    current: RwLock<Arc<Registry>>,
    // The snapshot file has a single writer at a time, even across swaps.
    write_lock: Mutex<()>,
}

impl RegistryStore {
    /// Open the store, loading `path` if it holds a valid snapshot.
    pub fn open(path: impl Into<PathBuf>, empty_masks: EmptyMaskPolicy) -> Self {
        let path = path.into();
        let registry = Registry::load_file_or_default(&path, empty_masks);
        Self {
            path,
            empty_masks,
            current: RwLock::new(Arc::new(registry)),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store around an existing registry without touching the disk.
    pub fn with_registry(path: impl Into<PathBuf>, registry: Registry) -> Self {
        Self {
            path: path.into(),
            empty_masks: registry.empty_mask_policy(),
            current: RwLock::new(Arc::new(registry)),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live registry.
    pub fn current(&self) -> Arc<Registry> {
        self.current.read().clone()
    }

    /// Write the live registry to the snapshot file.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        self.current().save_file(&self.path)
    }

    /// Drop in-memory state and load the snapshot file again.
    ///
    /// A missing or unreadable file yields an empty registry.
    pub fn reload(&self) {
        let registry = Registry::load_file_or_default(&self.path, self.empty_masks);
        *self.current.write() = Arc::new(registry);
        info!(path = %self.path.display(), "OPs list reloaded");
    }

    /// Replace the registry with an empty one and persist it.
    ///
    /// The in-memory state is cleared even when the write fails.
    pub fn clear(&self) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let registry = Arc::new(Registry::new(self.empty_masks));
        *self.current.write() = Arc::clone(&registry);
        info!(path = %self.path.display(), "OPs list cleared");
        registry.save_file(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_discards_unsaved_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("ops.json"), EmptyMaskPolicy::Deny);

        store.current().add("#chan", "alice", "alice!a@host1");
        store.persist().unwrap();
        store.current().add("#chan", "bob", "bob!b@host2");

        store.reload();
        assert_eq!(store.current().list_nicks("#chan"), vec!["alice"]);
    }

    #[test]
    fn test_clear_persists_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.json");
        let store = RegistryStore::open(&path, EmptyMaskPolicy::Deny);

        store.current().add("#chan", "alice", "alice!a@host1");
        store.persist().unwrap();

        store.clear().unwrap();
        assert!(store.current().list_nicks("#chan").is_empty());

        let reopened = RegistryStore::open(&path, EmptyMaskPolicy::Deny);
        assert!(reopened.current().list_nicks("#chan").is_empty());
    }

    #[test]
    fn test_persist_error_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("ops.json");
        let store = RegistryStore::open(&path, EmptyMaskPolicy::Deny);

        store.current().add("#chan", "alice", "alice!a@host1");
        assert!(matches!(store.persist(), Err(RegistryError::Io(_))));
        assert!(store.current().has("#chan", "alice"));
    }
}
