//! Registry of authorized nicks per channel.
//!
//! The top-level channel map is a `DashMap`; each [`ChannelEntry`] guards its
//! own nick map. The registry-level save lock serializes snapshot writes so
//! that two saves never interleave.

mod channel;
mod snapshot;
mod store;

pub use channel::{ChannelEntry, EmptyMaskPolicy, NICK_PLACEHOLDER};
pub use snapshot::{ChannelSnapshot, Snapshot};
pub use store::RegistryStore;

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-channel authorization data plus modification timestamp.
#[derive(Debug)]
pub struct Registry {
    channels: DashMap<String, Arc<ChannelEntry>>,
    modified: RwLock<DateTime<Utc>>,
    save_lock: Mutex<()>,
    empty_masks: EmptyMaskPolicy,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(empty_masks: EmptyMaskPolicy) -> Self {
        Self {
            channels: DashMap::new(),
            modified: RwLock::new(Utc::now()),
            save_lock: Mutex::new(()),
            empty_masks,
        }
    }

    pub fn empty_mask_policy(&self) -> EmptyMaskPolicy {
        self.empty_masks
    }

    pub fn modified(&self) -> DateTime<Utc> {
        *self.modified.read()
    }

    /// Get the entry for `channel`, creating an empty one on first access.
    pub fn get(&self, channel: &str) -> Arc<ChannelEntry> {
        if let Some(entry) = self.channels.get(channel) {
            return Arc::clone(entry.value());
        }
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| {
                debug!(channel = %channel, "Creating channel with empty op list");
                Arc::new(ChannelEntry::new())
            })
            .value()
            .clone()
    }

    /// Names of all known channels, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn add(&self, channel: &str, nick: &str, mask: &str) -> bool {
        let added = self.get(channel).add(nick, mask);
        if added {
            debug!(channel = %channel, nick = %nick, mask = %mask, "Added hostmask");
        } else {
            debug!(channel = %channel, nick = %nick, mask = %mask, "Hostmask already registered");
        }
        added
    }

    pub fn remove(&self, channel: &str, nick: &str) -> bool {
        self.get(channel).remove(nick)
    }

    pub fn remove_hostmask(&self, channel: &str, nick: &str, mask: &str) -> bool {
        self.get(channel).remove_hostmask(nick, mask)
    }

    pub fn clear_hostmasks(&self, channel: &str, nick: &str) -> bool {
        self.get(channel).clear_hostmasks(nick)
    }

    pub fn list_nicks(&self, channel: &str) -> Vec<String> {
        self.get(channel).nicks()
    }

    pub fn hostmasks(&self, channel: &str, nick: &str) -> Option<Vec<String>> {
        self.get(channel).hostmasks(nick)
    }

    pub fn has(&self, channel: &str, nick: &str) -> bool {
        self.get(channel).has(nick)
    }

    /// True when no nick is authorized for `channel`.
    pub fn is_empty(&self, channel: &str) -> bool {
        self.get(channel).is_empty()
    }

    /// Check `mask` against the patterns of `nick` in `channel`.
    ///
    /// A registered nick without patterns is decided by the registry's
    /// [`EmptyMaskPolicy`].
    pub fn match_hostmask(&self, channel: &str, nick: &str, mask: &str) -> bool {
        self.get(channel).matches(nick, mask, self.empty_masks)
    }

    pub fn set_welcome(&self, channel: &str, template: &str) {
        self.get(channel).set_welcome(template);
    }

    /// Welcome message for `nick`; see [`ChannelEntry::welcome_for`].
    pub fn get_welcome(&self, channel: &str, nick: &str) -> String {
        self.get(channel).welcome_for(nick)
    }

    // ========== Snapshot conversion ==========

    /// Build a serializable snapshot of the current state.
    pub fn to_snapshot(&self) -> Snapshot {
        let channels = self
            .channels
            .iter()
            .map(|entry| {
                let (wmsg, ops) = entry.value().to_parts();
                (
                    entry.key().clone(),
                    ChannelSnapshot {
                        wmsg,
                        ops: ops.into_iter().collect(),
                    },
                )
            })
            .collect();
        Snapshot {
            modified: self.modified(),
            channels,
        }
    }

    /// Rebuild a registry from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot, empty_masks: EmptyMaskPolicy) -> Self {
        let channels = DashMap::new();
        for (name, chan) in snapshot.channels {
            let ops: HashMap<String, Vec<String>> = chan.ops.into_iter().collect();
            channels.insert(name, Arc::new(ChannelEntry::from_parts(chan.wmsg, ops)));
        }
        Self {
            channels,
            modified: RwLock::new(snapshot.modified),
            save_lock: Mutex::new(()),
            empty_masks,
        }
    }

    // ========== Persistence ==========

    /// Deserialize a registry from a reader.
    pub fn load<R: Read>(reader: R, empty_masks: EmptyMaskPolicy) -> Result<Self, RegistryError> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        Ok(Self::from_snapshot(snapshot, empty_masks))
    }

    /// Load a registry from `path`.
    pub fn load_file(path: &Path, empty_masks: EmptyMaskPolicy) -> Result<Self, RegistryError> {
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file), empty_masks)
    }

    /// Load a registry from `path`, falling back to an empty one on failure.
    pub fn load_file_or_default(path: &Path, empty_masks: EmptyMaskPolicy) -> Self {
        match Self::load_file(path, empty_masks) {
            Ok(registry) => {
                info!(path = %path.display(), "OPs list loaded");
                registry
            }
            Err(RegistryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "No OPs file yet, starting empty");
                Self::new(empty_masks)
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    code = e.error_code(),
                    "Failed to load OPs file, starting empty"
                );
                Self::new(empty_masks)
            }
        }
    }

    /// Serialize the whole registry to `writer`, updating the timestamp first.
    ///
    /// Returns the number of bytes written.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<usize, RegistryError> {
        let _guard = self.save_lock.lock();
        let bytes = self.snapshot_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }

    /// Write the snapshot to `path`, replacing any previous file.
    ///
    /// The data goes to `<path>.tmp` first and is renamed into place.
    pub fn save_file(&self, path: &Path) -> Result<(), RegistryError> {
        let _guard = self.save_lock.lock();
        let bytes = self.snapshot_bytes()?;

        let tmp = tmp_path(path);
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;

        info!(path = %path.display(), bytes = bytes.len(), "Saved OPs list");
        Ok(())
    }

    fn snapshot_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        {
            let mut modified = self.modified.write();
            let now = Utc::now();
            if now > *modified {
                *modified = now;
            }
        }
        Ok(self.to_snapshot().to_pretty_json()?)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Registry {
        let registry = Registry::new(EmptyMaskPolicy::Deny);
        registry.add("#chan", "alice", "alice!a@host1");
        registry.add("#chan", "alice", "alice!*@*.example.org");
        registry.add("#chan", "bob", "bob!b@host2");
        registry.add("#other", "carol", "carol!*@*");
        registry.set_welcome("#chan", "Welcome back, {nick}");
        registry
    }

    #[test]
    fn test_get_creates_lazily() {
        let registry = Registry::new(EmptyMaskPolicy::Deny);
        assert!(registry.channel_names().is_empty());
        assert!(registry.is_empty("#new"));
        assert_eq!(registry.channel_names(), vec!["#new"]);
        assert!(Arc::ptr_eq(&registry.get("#new"), &registry.get("#new")));
    }

    #[test]
    fn test_round_trip_through_writer() {
        let registry = populated();
        let before = registry.modified();

        let mut buf = Vec::new();
        let written = registry.save(&mut buf).unwrap();
        assert_eq!(written, buf.len());
        assert!(registry.modified() >= before);

        let loaded = Registry::load(buf.as_slice(), EmptyMaskPolicy::Deny).unwrap();
        assert_eq!(loaded.list_nicks("#chan"), vec!["alice", "bob"]);
        assert_eq!(loaded.list_nicks("#other"), vec!["carol"]);
        assert_eq!(
            loaded.hostmasks("#chan", "alice"),
            registry.hostmasks("#chan", "alice")
        );
        assert_eq!(loaded.get_welcome("#chan", "alice"), "Welcome back, alice");
        assert_eq!(loaded.modified(), registry.modified());
    }

    #[test]
    fn test_save_file_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.json");

        let registry = populated();
        registry.save_file(&path).unwrap();
        assert!(!tmp_path(&path).exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));

        let loaded = Registry::load_file(&path, EmptyMaskPolicy::Deny).unwrap();
        assert!(loaded.match_hostmask("#chan", "alice", "alice!x@box.example.org"));
        assert!(!loaded.match_hostmask("#chan", "alice", "alice!x@box.example.com"));
    }

    #[test]
    fn test_missing_or_malformed_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        let registry = Registry::load_file_or_default(&missing, EmptyMaskPolicy::Deny);
        assert!(registry.channel_names().is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"channels\": {\"#chan\": ").unwrap();
        assert!(matches!(
            Registry::load_file(&broken, EmptyMaskPolicy::Deny),
            Err(RegistryError::Json(_))
        ));
        let registry = Registry::load_file_or_default(&broken, EmptyMaskPolicy::Deny);
        assert!(registry.channel_names().is_empty());
    }

    #[test]
    fn test_end_to_end_mask_lifecycle() {
        let registry = Registry::new(EmptyMaskPolicy::Deny);
        assert!(registry.is_empty("#chan"));

        assert!(registry.add("#chan", "alice", "alice!a@host1"));
        assert!(registry.match_hostmask("#chan", "alice", "alice!a@host1"));

        assert!(registry.remove_hostmask("#chan", "alice", "alice!a@host1"));
        assert!(!registry.match_hostmask("#chan", "alice", "alice!a@host1"));
        assert!(registry.has("#chan", "alice"));
    }

    #[test]
    fn test_allow_policy_for_empty_masks() {
        let registry = Registry::new(EmptyMaskPolicy::Allow);
        registry.add("#chan", "alice", "alice!a@host1");
        registry.clear_hostmasks("#chan", "alice");
        assert!(registry.match_hostmask("#chan", "alice", "alice!z@anywhere"));
        assert!(!registry.match_hostmask("#chan", "bob", "bob!z@anywhere"));
    }

    #[test]
    fn test_concurrent_adds() {
        let registry = Arc::new(Registry::new(EmptyMaskPolicy::Deny));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        registry.add("#chan", &format!("nick{i}"), &format!("nick{i}!u@h{j}"));
                        registry.add("#chan", &format!("nick{i}"), &format!("nick{i}!u@h{j}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.list_nicks("#chan").len(), 8);
        assert_eq!(registry.hostmasks("#chan", "nick3").unwrap().len(), 50);
    }
}
