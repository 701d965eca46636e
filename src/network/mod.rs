//! Network transport.
//!
//! The authorization engine talks to the chat network only through the
//! [`Transport`] trait. [`client`] provides the IRC implementation used by the
//! `opbot` binary; tests plug in a recording double.

pub mod client;
pub mod message;
mod stream;
mod tls;

pub use client::{IrcClient, IrcHandle};
pub use message::IrcLine;

use crate::error::TransportError;
use async_trait::async_trait;

/// Side effects the engine asks the network to perform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The bot's own current nick.
    fn own_nick(&self) -> String;

    /// Start an identity lookup (WHOIS) for `nick`.
    ///
    /// The reply arrives later through the event feed.
    async fn lookup(&self, nick: &str) -> Result<(), TransportError>;

    /// Grant (`+o`) or revoke (`-o`) operator status.
    async fn set_privilege(
        &self,
        channel: &str,
        nick: &str,
        grant: bool,
    ) -> Result<(), TransportError>;

    /// Send a message to a channel or nick. Multi-line text is split.
    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError>;

    /// Send a notice. Transports without notices fall back to [`send`](Self::send).
    async fn notify(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(target, text).await
    }
}
