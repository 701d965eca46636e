//! Tracing setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Standardized span constructors for bot observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one bot command.
    pub fn command(verb: &str, channel: &str, caller: &str) -> Span {
        info_span!("command", verb = %verb, channel = %channel, caller = %caller)
    }

    /// Span for a background identity verification.
    pub fn verification(nick: &str, channel: &str) -> Span {
        info_span!("verification", nick = %nick, channel = %channel)
    }

    /// Span for the IRC connection.
    pub fn connection(server: &str, nick: &str) -> Span {
        info_span!("connection", server = %server, nick = %nick)
    }
}
