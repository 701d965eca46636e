//! ADD and DEL command handlers.

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};
use crate::telemetry::spans;
use crate::verify::LookupOutcome;
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};

impl OpBot {
    /// `add <nick>`: look `nick` up and register its current hostmask.
    ///
    /// The lookup runs on a background task; the result is announced in the
    /// channel when it completes. The entry is stored under the nick from the
    /// WHOIS reply, which may differ in case from what the caller typed.
    pub(super) fn handle_add(self: &Arc<Self>, channel: &str, args: &[&str]) -> CommandReply {
        let Some(nick) = args.first().map(|s| s.to_string()) else {
            return CommandReply::ok(format!("{REPLY_PREFIX}: Cannot add empty nick"));
        };

        let bot = Arc::clone(self);
        let channel = channel.to_string();
        let span = spans::verification(&nick, &channel);
        let text = format!("{REPLY_PREFIX}: Verifying {nick}...");
        tokio::spawn(async move { bot.verify_and_add(&channel, &nick).await }.instrument(span));

        CommandReply::ok(text)
    }

    async fn verify_and_add(&self, channel: &str, nick: &str) {
        let outcome = match self.broker.verify(nick, self.whois_timeout).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Identity lookup failed");
                return;
            }
        };

        let text = match outcome {
            LookupOutcome::Found(found) => {
                // Register the nick as the server spells it; joins report it that way.
                let nick = found.nick.clone();
                let mask = found.to_string();
                let added = self.registry().add(channel, &nick, &mask);
                let mut text = if added {
                    info!(nick = %nick, mask = %mask, "Nick added to OPs list");
                    format!("{REPLY_PREFIX}: Nick {nick} added to OPs list as {mask}")
                } else {
                    format!("{REPLY_PREFIX}: Nick {nick} already registered as {mask}")
                };
                if added && let Err(e) = self.store.persist() {
                    error!(error = %e, code = e.error_code(), "Failed to save OPs list");
                    text.push_str(&format!(" (not saved: {e})"));
                }
                if let Err(e) = self.transport.set_privilege(channel, &nick, true).await {
                    warn!(error = %e, "Failed to grant OP");
                }
                text
            }
            LookupOutcome::NotFound => {
                warn!("Cannot add unknown nick");
                format!("{REPLY_PREFIX}: Cannot add {nick}: no such nick")
            }
            LookupOutcome::TimedOut => {
                format!("{REPLY_PREFIX}: Cannot add {nick}: lookup timed out")
            }
        };

        if let Err(e) = self.transport.send(channel, &text).await {
            warn!(error = %e, "Failed to send reply");
        }
    }

    /// `del <nick>`: remove `nick` with all its hostmasks and take OP away.
    pub(super) async fn handle_del(&self, channel: &str, args: &[&str]) -> CommandReply {
        let Some(nick) = args.first() else {
            return CommandReply::ok(format!("{REPLY_PREFIX}: Cannot delete empty nick"));
        };

        if !self.registry().remove(channel, nick) {
            return CommandReply::ok(format!("{REPLY_PREFIX}: {nick} is NOT registered as OP"));
        }
        info!(channel = %channel, nick = %nick, "Nick removed from OPs list");

        let result = self.store.persist();
        if let Err(e) = self.transport.set_privilege(channel, nick, false).await {
            warn!(channel = %channel, nick = %nick, error = %e, "Failed to revoke OP");
        }
        CommandReply::saved(
            format!("{REPLY_PREFIX}: Nick {nick} removed from OPs list"),
            result,
        )
    }
}
