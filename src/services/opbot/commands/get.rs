//! GET command handler.

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};
use crate::telemetry::spans;
use crate::verify::LookupOutcome;
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};

impl OpBot {
    /// `get`: verify the caller's own hostmask and grant OP on a match.
    pub(super) fn handle_get(self: &Arc<Self>, channel: &str, caller_nick: &str) -> CommandReply {
        let bot = Arc::clone(self);
        let channel = channel.to_string();
        let nick = caller_nick.to_string();
        let span = spans::verification(&nick, &channel);
        tokio::spawn(async move { bot.verify_and_grant(&channel, &nick).await }.instrument(span));

        CommandReply::ok(format!("{REPLY_PREFIX}: Verifying {caller_nick}..."))
    }

    async fn verify_and_grant(&self, channel: &str, nick: &str) {
        let outcome = match self.broker.verify(nick, self.whois_timeout).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Identity lookup failed");
                return;
            }
        };

        let denial = match outcome {
            LookupOutcome::Found(mask) => {
                let mask = mask.to_string();
                if self.registry().match_hostmask(channel, nick, &mask) {
                    info!(mask = %mask, "Hostmask verified, granting OP");
                    if let Err(e) = self.transport.set_privilege(channel, nick, true).await {
                        warn!(error = %e, "Failed to grant OP");
                    }
                    return;
                }
                warn!(mask = %mask, "Hostmask did not match");
                format!("{REPLY_PREFIX}: {nick} ({mask}) is not allowed OP in {channel}")
            }
            LookupOutcome::NotFound => {
                format!("{REPLY_PREFIX}: Unable to verify {nick}: no such nick")
            }
            LookupOutcome::TimedOut => {
                format!("{REPLY_PREFIX}: Unable to verify {nick}: lookup timed out")
            }
        };

        if let Err(e) = self.transport.send(channel, &denial).await {
            warn!(error = %e, "Failed to send reply");
        }
    }
}
