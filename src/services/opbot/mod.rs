//! OPBot - automatic channel operator service.
//!
//! Handles:
//! - `JOIN` of a registered nick: grant `+o` when the hostmask matches
//! - `<trigger> <verb> [args]` in a channel: manage the op list
//! - WHOIS replies: complete pending identity verifications

mod commands;
mod join;

pub use commands::{CommandReply, Verb, help_text};

use crate::caller::CallerTracker;
use crate::config::OpBotConfig;
use crate::hostmask::HostMask;
use crate::network::Transport;
use crate::registry::{Registry, RegistryStore};
use crate::verify::VerificationBroker;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of every reply the bot sends.
pub const REPLY_PREFIX: &str = "OPBot";

/// The auto-op service.
pub struct OpBot {
    store: RegistryStore,
    broker: VerificationBroker,
    tracker: CallerTracker,
    transport: Arc<dyn Transport>,
    trigger: String,
    whois_timeout: Duration,
}

impl OpBot {
    pub fn new(store: RegistryStore, transport: Arc<dyn Transport>, config: &OpBotConfig) -> Self {
        Self {
            store,
            broker: VerificationBroker::new(Arc::clone(&transport)),
            tracker: CallerTracker::new(),
            transport,
            trigger: config.trigger.clone(),
            whois_timeout: config.whois_timeout(),
        }
    }

    /// The live registry. Do not hold on to it across a reload.
    pub fn registry(&self) -> Arc<Registry> {
        self.store.current()
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn broker(&self) -> &VerificationBroker {
        &self.broker
    }

    pub fn tracker(&self) -> &CallerTracker {
        &self.tracker
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Split `text` into command arguments if it starts with the trigger.
    ///
    /// The trigger itself is not part of the result, so `"!op ls"` gives
    /// `["ls"]` and a bare `"!op"` gives an empty list.
    pub fn parse_command(&self, text: &str) -> Option<Vec<String>> {
        let mut words = text.split_whitespace();
        let first = words.next()?;
        if !first.eq_ignore_ascii_case(&self.trigger) {
            return None;
        }
        Some(words.map(str::to_string).collect())
    }

    /// Handle a `PRIVMSG` from `source` to `target`.
    ///
    /// Every message updates the caller tracker, commands or not.
    pub async fn on_privmsg(self: &Arc<Self>, source: &HostMask, target: &str, text: &str) {
        self.tracker.record(&source.nick, &source.to_string());

        let Some(argv) = self.parse_command(text) else {
            return;
        };

        if !is_channel(target) {
            debug!(nick = %source.nick, "Command sent in private");
            let text = format!(
                "{REPLY_PREFIX}: Commands must be given in a channel, e.g. \"{} ls\"",
                self.trigger
            );
            if let Err(e) = self.transport.notify(&source.nick, &text).await {
                warn!(error = %e, "Failed to send notice");
            }
            return;
        }

        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        let reply = self.dispatch(target, &source.nick, &args).await;
        if let Err(e) = self.transport.send(target, &reply.text).await {
            warn!(channel = %target, error = %e, "Failed to send reply");
        }
    }

    /// WHOIS user reply (`311`).
    pub fn on_whois_user(&self, mask: HostMask) {
        self.broker.deliver_found(mask);
    }

    /// No such nick (`401`).
    pub fn on_no_such_nick(&self, nick: &str) {
        self.broker.deliver_not_found(nick);
    }
}

fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::registry::EmptyMaskPolicy;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl Transport for Silent {
        fn own_nick(&self) -> String {
            "opbot".into()
        }
        async fn lookup(&self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn set_privilege(&self, _: &str, _: &str, _: bool) -> Result<(), TransportError> {
            Ok(())
        }
        async fn send(&self, _: &str, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn bot() -> OpBot {
        let store = RegistryStore::with_registry(
            "/nonexistent/opbot.json",
            Registry::new(EmptyMaskPolicy::Deny),
        );
        OpBot::new(store, Arc::new(Silent), &OpBotConfig::default())
    }

    #[test]
    fn test_parse_command() {
        let bot = bot();
        assert_eq!(
            bot.parse_command("!op add bob"),
            Some(vec!["add".to_string(), "bob".to_string()])
        );
        assert_eq!(bot.parse_command("!OP   ls "), Some(vec!["ls".to_string()]));
        assert_eq!(bot.parse_command("!op"), Some(vec![]));
        assert_eq!(bot.parse_command("!opx ls"), None);
        assert_eq!(bot.parse_command("hello !op ls"), None);
        assert_eq!(bot.parse_command(""), None);
        assert_eq!(bot.parse_command("   "), None);
    }

    #[test]
    fn test_parse_command_keeps_welcome_spacing() {
        let bot = bot();
        assert_eq!(
            bot.parse_command("!op wmsg set  Hi  {nick},   welcome! "),
            Some(vec![
                "wmsg".to_string(),
                "set".to_string(),
                "Hi  {nick},   welcome!".to_string()
            ])
        );
        assert_eq!(
            bot.parse_command("!op WMSG Set a\tb"),
            Some(vec!["WMSG".to_string(), "Set".to_string(), "a\tb".to_string()])
        );
        assert_eq!(
            bot.parse_command("!op wmsg set   "),
            Some(vec!["wmsg".to_string(), "set".to_string()])
        );
        assert_eq!(
            bot.parse_command("!op mask  add bob   b!*@*"),
            Some(vec![
                "mask".to_string(),
                "add".to_string(),
                "bob".to_string(),
                "b!*@*".to_string()
            ])
        );
    }

    #[test]
    fn test_is_channel() {
        assert!(is_channel("#chan"));
        assert!(is_channel("&local"));
        assert!(!is_channel("opbot"));
    }
}
