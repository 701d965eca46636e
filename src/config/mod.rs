//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, IrcConfig, OpBotConfig, LogConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup validation

mod defaults;
mod types;
pub mod validation;

pub use types::{
    Config, ConfigError, DEBUG_ENV, IrcConfig, LogConfig, NICK_ENV, OPFILE_ENV, OpBotConfig,
    PASS_ENV, SERVER_ENV, TLS_ENV, USER_ENV,
};
pub use validation::{ValidationError, validate};
