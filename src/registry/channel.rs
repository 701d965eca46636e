//! Per-channel authorization entry.

use crate::hostmask;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;

/// Placeholder replaced by the authorized nick in welcome templates.
pub const NICK_PLACEHOLDER: &str = "{nick}";

/// What `matches` answers for a nick that is registered with no patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMaskPolicy {
    /// A nick with no patterns never matches.
    #[default]
    Deny,
    /// A nick with no patterns matches any hostmask.
    Allow,
}

#[derive(Debug, Default)]
struct ChannelData {
    welcome: String,
    ops: HashMap<String, Vec<String>>,
}

/// Authorized nicks and welcome template for one channel.
///
/// Reads (lookups, matches, listings) take the read lock; mutations take the
/// write lock. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct ChannelEntry {
    data: RwLock<ChannelData>,
}

impl ChannelEntry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(welcome: String, ops: HashMap<String, Vec<String>>) -> Self {
        Self {
            data: RwLock::new(ChannelData { welcome, ops }),
        }
    }

    /// Copy out the welcome template and the nick map for serialization.
    pub(crate) fn to_parts(&self) -> (String, HashMap<String, Vec<String>>) {
        let data = self.data.read();
        (data.welcome.clone(), data.ops.clone())
    }

    /// Add `mask` to the nick's pattern set, creating the nick if absent.
    ///
    /// Returns `false` when the pattern was already present.
    pub fn add(&self, nick: &str, mask: &str) -> bool {
        let mut data = self.data.write();
        let masks = data.ops.entry(nick.to_string()).or_default();
        if masks.iter().any(|m| m == mask) {
            return false;
        }
        masks.push(mask.to_string());
        true
    }

    /// Register a nick with no patterns. Existing patterns are kept.
    ///
    /// Returns `false` when the nick was already registered.
    pub fn add_nick(&self, nick: &str) -> bool {
        let mut data = self.data.write();
        if data.ops.contains_key(nick) {
            return false;
        }
        data.ops.insert(nick.to_string(), Vec::new());
        true
    }

    /// Remove a nick and all of its patterns.
    pub fn remove(&self, nick: &str) -> bool {
        self.data.write().ops.remove(nick).is_some()
    }

    /// Remove one literal pattern from a nick.
    pub fn remove_hostmask(&self, nick: &str, mask: &str) -> bool {
        let mut data = self.data.write();
        let Some(masks) = data.ops.get_mut(nick) else {
            return false;
        };
        let before = masks.len();
        masks.retain(|m| m != mask);
        masks.len() != before
    }

    /// Empty a nick's pattern set while keeping the nick registered.
    pub fn clear_hostmasks(&self, nick: &str) -> bool {
        match self.data.write().ops.get_mut(nick) {
            Some(masks) => {
                masks.clear();
                true
            }
            None => false,
        }
    }

    /// Sorted snapshot of registered nicks.
    pub fn nicks(&self) -> Vec<String> {
        let mut nicks: Vec<String> = self.data.read().ops.keys().cloned().collect();
        nicks.sort();
        nicks
    }

    /// Sorted patterns for a nick, or `None` if the nick is not registered.
    pub fn hostmasks(&self, nick: &str) -> Option<Vec<String>> {
        let mut masks = self.data.read().ops.get(nick)?.clone();
        masks.sort();
        Some(masks)
    }

    pub fn has(&self, nick: &str) -> bool {
        self.data.read().ops.contains_key(nick)
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().ops.is_empty()
    }

    /// Check a hostmask against the patterns registered for `nick`.
    pub fn matches(&self, nick: &str, mask: &str, empty_masks: EmptyMaskPolicy) -> bool {
        let data = self.data.read();
        let Some(patterns) = data.ops.get(nick) else {
            return false;
        };
        if patterns.is_empty() {
            return empty_masks == EmptyMaskPolicy::Allow;
        }
        patterns.iter().any(|p| hostmask::matches(p, mask))
    }

    pub fn set_welcome(&self, template: &str) {
        self.data.write().welcome = template.to_string();
    }

    /// The raw welcome template (empty when unset).
    pub fn welcome_template(&self) -> String {
        self.data.read().welcome.clone()
    }

    /// Render the welcome template for `nick`.
    ///
    /// With an empty nick the raw template comes back unchanged, placeholder
    /// included.
    pub fn welcome_for(&self, nick: &str) -> String {
        let data = self.data.read();
        if !nick.is_empty() && data.welcome.contains(NICK_PLACEHOLDER) {
            data.welcome.replace(NICK_PLACEHOLDER, nick)
        } else {
            data.welcome.clone()
        }
    }
}
