//! Identity verification broker.
//!
//! Bridges a command that needs a caller's real hostmask with the WHOIS
//! reply that the network delivers later on the event feed.
//!
//! Every request gets its own token and a single-use `oneshot` slot, so
//! overlapping lookups never receive each other's replies. WHOIS replies
//! carry no token; they are routed to the oldest pending request for the
//! same nick (RFC 1459 case-insensitive). Delivery never blocks: a reply
//! with no waiter is logged and dropped.

use crate::error::TransportError;
use crate::hostmask::{HostMask, irc_eq};
use crate::network::Transport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result of waiting for a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(HostMask),
    NotFound,
    TimedOut,
}

#[derive(Debug)]
enum Reply {
    Found(HostMask),
    NotFound,
}

#[derive(Debug)]
struct PendingEntry {
    token: u64,
    nick: String,
    reply_tx: oneshot::Sender<Reply>,
}

/// A lookup that has been sent and not yet awaited.
#[derive(Debug)]
pub struct PendingLookup {
    token: u64,
    nick: String,
    reply_rx: oneshot::Receiver<Reply>,
}

impl PendingLookup {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }
}

/// Correlates WHOIS requests with their replies.
pub struct VerificationBroker {
    transport: Arc<dyn Transport>,
    next_token: AtomicU64,
    // Insertion order is token order; delivery picks the first match.
    pending: Mutex<Vec<PendingEntry>>,
}

impl VerificationBroker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_token: AtomicU64::new(1),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of lookups still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Register a reply slot for `nick` and ask the network for its identity.
    ///
    /// The slot exists before the request leaves, so a fast reply is never
    /// lost. If the request cannot be sent the slot is released again.
    pub async fn request_identity(&self, nick: &str) -> Result<PendingLookup, TransportError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().push(PendingEntry {
            token,
            nick: nick.to_string(),
            reply_tx,
        });

        if let Err(e) = self.transport.lookup(nick).await {
            self.forget(token);
            return Err(e);
        }
        debug!(nick = %nick, token, "Identity lookup sent");

        Ok(PendingLookup {
            token,
            nick: nick.to_string(),
            reply_rx,
        })
    }

    /// Wait for the reply to `lookup`, at most `timeout`.
    pub async fn await_identity(&self, lookup: PendingLookup, timeout: Duration) -> LookupOutcome {
        let PendingLookup {
            token,
            nick,
            reply_rx,
        } = lookup;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(Reply::Found(mask))) => LookupOutcome::Found(mask),
            Ok(Ok(Reply::NotFound)) => LookupOutcome::NotFound,
            // Sender dropped without a reply.
            Ok(Err(_)) => LookupOutcome::NotFound,
            Err(_) => {
                self.forget(token);
                warn!(
                    nick = %nick,
                    token,
                    timeout_ms = timeout.as_millis() as u64,
                    "Identity lookup timed out"
                );
                LookupOutcome::TimedOut
            }
        }
    }

    /// Request and wait in one step.
    pub async fn verify(
        &self,
        nick: &str,
        timeout: Duration,
    ) -> Result<LookupOutcome, TransportError> {
        let lookup = self.request_identity(nick).await?;
        Ok(self.await_identity(lookup, timeout).await)
    }

    /// Deliver a successful lookup (WHOIS user reply).
    ///
    /// Returns `false` if nobody was waiting for this nick.
    pub fn deliver_found(&self, mask: HostMask) -> bool {
        let nick = mask.nick.clone();
        self.deliver(&nick, Reply::Found(mask))
    }

    /// Deliver a "no such nick" reply.
    pub fn deliver_not_found(&self, nick: &str) -> bool {
        self.deliver(nick, Reply::NotFound)
    }

    fn deliver(&self, nick: &str, reply: Reply) -> bool {
        let entry = {
            let mut pending = self.pending.lock();
            match pending.iter().position(|p| irc_eq(&p.nick, nick)) {
                Some(idx) => pending.remove(idx),
                None => {
                    debug!(nick = %nick, "Dropping identity reply with no waiter");
                    return false;
                }
            }
        };

        let token = entry.token;
        if entry.reply_tx.send(reply).is_err() {
            debug!(nick = %nick, token, "Identity waiter went away before delivery");
            return false;
        }
        true
    }

    fn forget(&self, token: u64) {
        self.pending.lock().retain(|p| p.token != token);
    }
}
