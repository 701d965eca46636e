//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("irc.nick is required")]
    MissingNick,
    #[error("irc.nick must not contain spaces or '!@', got '{0}'")]
    InvalidNick(String),
    #[error("irc.server must be host:port, got '{0}'")]
    InvalidServer(String),
    #[error("irc.channels entry must start with '#' or '&', got '{0}'")]
    InvalidChannel(String),
    #[error("opbot.trigger must be a single non-empty word")]
    InvalidTrigger,
    #[error("opbot.whois_timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("opbot.opfile parent directory does not exist: {0}")]
    OpfileDirMissing(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let nick = &config.irc.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if nick.contains([' ', '!', '@']) {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }

    let server_ok = config
        .irc
        .server
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !server_ok {
        errors.push(ValidationError::InvalidServer(config.irc.server.clone()));
    }

    for (name, _) in config.irc.channel_joins() {
        if !name.starts_with(['#', '&']) {
            errors.push(ValidationError::InvalidChannel(name));
        }
    }

    let trigger = &config.opbot.trigger;
    if trigger.is_empty() || trigger.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidTrigger);
    }

    if config.opbot.whois_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if let Some(parent) = config.opbot.opfile.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::OpfileDirMissing(
            parent.display().to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
