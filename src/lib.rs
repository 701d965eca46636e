//! slirc-opbot - automatic channel operator bot.
//!
//! Keeps a per-channel list of nicks allowed to hold channel operator
//! status, each with accepted hostmask patterns, and grants `+o` to them
//! when they join. The list is managed with in-channel commands whose
//! targets are verified with a WHOIS round trip.

pub mod caller;
pub mod config;
pub mod error;
pub mod hostmask;
pub mod network;
pub mod policy;
pub mod registry;
pub mod services;
pub mod telemetry;
pub mod verify;
