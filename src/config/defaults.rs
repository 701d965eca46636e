//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::path::PathBuf;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// IRC Defaults
// =============================================================================

pub fn default_user() -> String {
    "opbot".to_string()
}

pub fn default_realname() -> String {
    "opbot".to_string()
}

// =============================================================================
// OP Bot Defaults
// =============================================================================

pub fn default_opfile() -> PathBuf {
    PathBuf::from("/tmp/opbot.json")
}

pub fn default_trigger() -> String {
    "!op".to_string()
}

pub fn default_whois_timeout_ms() -> u64 {
    5000
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}
