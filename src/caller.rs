//! Tracks the most recent speaker seen on the network.

use parking_lot::RwLock;

/// Nick and hostmask of the last user seen speaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerState {
    pub nick: String,
    pub hostmask: String,
}

/// Last-writer-wins record of the latest speaker, across all channels.
///
/// The IRC client records a message's sender before dispatching that same
/// message, so a command always sees its own sender here.
#[derive(Debug, Default)]
pub struct CallerTracker {
    last: RwLock<Option<CallerState>>,
}

impl CallerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, nick: &str, hostmask: &str) {
        *self.last.write() = Some(CallerState {
            nick: nick.to_string(),
            hostmask: hostmask.to_string(),
        });
    }

    /// The last recorded speaker, if any message has been seen yet.
    pub fn snapshot(&self) -> Option<CallerState> {
        self.last.read().clone()
    }
}
