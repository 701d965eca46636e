//! Integration test common infrastructure.
//!
//! Provides a recording transport for driving the bot through its public
//! API, and a scripted IRC server for exercising the real client.

pub mod server;
pub mod transport;

#[allow(unused_imports)]
pub use server::{FakeServer, ServerConn};
#[allow(unused_imports)]
pub use transport::{Event, MockTransport, bot_with};
