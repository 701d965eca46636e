//! Bot services.
//!
//! Services react to network events handed over by the client and answer
//! through the [`Transport`](crate::network::Transport) they were built with.

pub mod opbot;

pub use opbot::{CommandReply, OpBot};
