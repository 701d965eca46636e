//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_log_level, default_opfile, default_realname, default_trigger, default_true,
    default_user, default_whois_timeout_ms,
};
use crate::registry::EmptyMaskPolicy;

/// Environment variable that overrides `opbot.opfile`.
pub const OPFILE_ENV: &str = "OPBOT_FILE";
/// Environment variable that overrides `irc.server`.
pub const SERVER_ENV: &str = "IRC_SERVER";
/// Environment variable that overrides `irc.nick`.
pub const NICK_ENV: &str = "IRC_NICK";
/// Environment variable that overrides `irc.user`.
pub const USER_ENV: &str = "IRC_USER";
/// Environment variable that overrides `irc.password`.
pub const PASS_ENV: &str = "IRC_PASS";
/// Environment variable that overrides `irc.tls`.
pub const TLS_ENV: &str = "IRC_TLS";
/// Environment variable that forces `log.level = "debug"` when truthy.
pub const DEBUG_ENV: &str = "DEBUG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Get a static error code string for log labelling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "config_io",
            Self::Parse(_) => "config_parse",
        }
    }
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IRC connection settings.
    pub irc: IrcConfig,
    /// Authorization engine settings.
    #[serde(default)]
    pub opbot: OpBotConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are ignored. Boolean variables accept `1`, `true`,
    /// `yes` and `on` (any case); anything else reads as false.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(opfile) = get(OPFILE_ENV) {
            self.opbot.opfile = PathBuf::from(opfile);
        }
        if let Some(server) = get(SERVER_ENV) {
            self.irc.server = server;
        }
        if let Some(nick) = get(NICK_ENV) {
            self.irc.nick = nick;
        }
        if let Some(user) = get(USER_ENV) {
            self.irc.user = user;
        }
        if let Some(password) = get(PASS_ENV) {
            self.irc.password = Some(password);
        }
        if let Some(tls) = get(TLS_ENV) {
            self.irc.tls = env_flag(&tls);
        }
        if get(DEBUG_ENV).is_some_and(|v| env_flag(&v)) {
            self.log.level = "debug".to_string();
        }
    }
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// IRC connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// Server address as `host:port` (e.g., "irc.oftc.net:6697").
    pub server: String,
    /// Nick to register with.
    pub nick: String,
    /// Username (ident).
    #[serde(default = "default_user")]
    pub user: String,
    /// Real name (gecos).
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Server password, sent as PASS.
    pub password: Option<String>,
    /// Connect with TLS.
    #[serde(default)]
    pub tls: bool,
    /// Verify the server certificate against the system roots.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Channels to join, as "#name" or "#name key".
    #[serde(default)]
    pub channels: Vec<String>,
}

impl IrcConfig {
    /// Host part of `server`, used for TLS server name.
    pub fn host(&self) -> &str {
        self.server
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.server)
    }

    /// Channels split into `(name, key)` pairs.
    pub fn channel_joins(&self) -> Vec<(String, Option<String>)> {
        self.channels
            .iter()
            .filter_map(|spec| {
                let mut parts = spec.split_whitespace();
                let name = parts.next()?.to_string();
                let key = parts.next().map(str::to_string);
                Some((name, key))
            })
            .collect()
    }
}

/// Authorization engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpBotConfig {
    /// JSON snapshot of the op list.
    #[serde(default = "default_opfile")]
    pub opfile: PathBuf,
    /// Word that starts a bot command in a channel message.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// How long to wait for a WHOIS reply (milliseconds).
    #[serde(default = "default_whois_timeout_ms")]
    pub whois_timeout_ms: u64,
    /// Whether a registered nick without hostmasks is trusted.
    #[serde(default)]
    pub empty_masks: EmptyMaskPolicy,
}

impl OpBotConfig {
    pub fn whois_timeout(&self) -> Duration {
        Duration::from_millis(self.whois_timeout_ms)
    }
}

impl Default for OpBotConfig {
    fn default() -> Self {
        Self {
            opfile: default_opfile(),
            trigger: default_trigger(),
            whois_timeout_ms: default_whois_timeout_ms(),
            empty_masks: EmptyMaskPolicy::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset (e.g., "info", "slirc_opbot=debug").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL: &str = r##"
[irc]
server = "irc.oftc.net:6697"
nick = "opbot"
password = "hunter2"
tls = true
channels = ["#chan", "#locked sekrit"]

[opbot]
opfile = "/var/lib/opbot/ops.json"
trigger = "!ops"
whois_timeout_ms = 2500
empty_masks = "allow"

[log]
level = "debug"
json = true
"##;

    #[test]
    fn test_full_config() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.irc.host(), "irc.oftc.net");
        assert_eq!(config.irc.user, "opbot");
        assert!(config.irc.tls);
        assert!(config.irc.verify_cert);
        assert_eq!(
            config.irc.channel_joins(),
            vec![
                ("#chan".to_string(), None),
                ("#locked".to_string(), Some("sekrit".to_string())),
            ]
        );
        assert_eq!(config.opbot.opfile, PathBuf::from("/var/lib/opbot/ops.json"));
        assert_eq!(config.opbot.trigger, "!ops");
        assert_eq!(config.opbot.whois_timeout(), Duration::from_millis(2500));
        assert_eq!(config.opbot.empty_masks, EmptyMaskPolicy::Allow);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.json);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::parse(
            r#"
[irc]
server = "localhost:6667"
nick = "opbot"
"#,
        )
        .unwrap();
        assert!(!config.irc.tls);
        assert!(config.irc.channels.is_empty());
        assert_eq!(config.opbot.opfile, PathBuf::from("/tmp/opbot.json"));
        assert_eq!(config.opbot.trigger, "!op");
        assert_eq!(config.opbot.whois_timeout_ms, 5000);
        assert_eq!(config.opbot.empty_masks, EmptyMaskPolicy::Deny);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::parse(FULL).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (OPFILE_ENV, "/srv/ops.json"),
            (SERVER_ENV, "irc.libera.chat:6667"),
            (NICK_ENV, "guardbot"),
            (USER_ENV, "guard"),
            (PASS_ENV, "s3cret"),
            (TLS_ENV, "false"),
            (DEBUG_ENV, "1"),
        ]);
        config.log.level = "warn".to_string();
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.opbot.opfile, PathBuf::from("/srv/ops.json"));
        assert_eq!(config.irc.server, "irc.libera.chat:6667");
        assert_eq!(config.irc.nick, "guardbot");
        assert_eq!(config.irc.user, "guard");
        assert_eq!(config.irc.password.as_deref(), Some("s3cret"));
        assert!(!config.irc.tls);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::parse(FULL).unwrap();
        config.apply_env_from(|key| match key {
            NICK_ENV => Some(String::new()),
            TLS_ENV => Some(String::new()),
            DEBUG_ENV => Some("no".to_string()),
            _ => None,
        });
        assert_eq!(config.irc.nick, "opbot");
        assert!(config.irc.tls);
        assert_eq!(config.log.level, "debug");

        let mut quiet = Config::parse(FULL).unwrap();
        quiet.log.level = "info".to_string();
        quiet.apply_env_from(|key| (key == DEBUG_ENV).then(|| "off".to_string()));
        assert_eq!(quiet.log.level, "info");
    }

    #[test]
    fn test_bad_policy_is_parse_error() {
        let err = Config::parse(
            r#"
[irc]
server = "localhost:6667"
nick = "opbot"
[opbot]
empty_masks = "maybe"
"#,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "config_parse");
    }
}
