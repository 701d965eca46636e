//! JOIN handling: automatic OP for registered nicks.

use super::OpBot;
use crate::hostmask::irc_eq;
use tracing::{debug, info, warn};

impl OpBot {
    /// `nick` with source `hostmask` joined `channel`.
    ///
    /// Grants OP when the nick is registered for the channel and the
    /// hostmask matches, then sends the welcome message if one is set.
    pub async fn on_join(&self, channel: &str, nick: &str, hostmask: &str) {
        if channel.is_empty() || nick.is_empty() {
            return;
        }
        if irc_eq(nick, &self.transport.own_nick()) {
            debug!(channel = %channel, "Ignoring own join");
            return;
        }

        let registry = self.registry();
        if registry.is_empty(channel) {
            debug!(channel = %channel, "OPs list is empty, nothing to do");
            return;
        }
        if !registry.has(channel, nick) {
            debug!(channel = %channel, nick = %nick, "Not in OPs list, ignoring");
            return;
        }
        if !registry.match_hostmask(channel, nick, hostmask) {
            warn!(
                channel = %channel,
                nick = %nick,
                hostmask = %hostmask,
                "Hostmask mismatch, not granting OP"
            );
            return;
        }

        info!(channel = %channel, nick = %nick, "Granting OP on join");
        if let Err(e) = self.transport.set_privilege(channel, nick, true).await {
            warn!(channel = %channel, nick = %nick, error = %e, "Failed to grant OP");
            return;
        }

        let welcome = registry.get_welcome(channel, nick);
        if !welcome.is_empty()
            && let Err(e) = self.transport.send(channel, &welcome).await
        {
            warn!(channel = %channel, error = %e, "Failed to send welcome message");
        }
    }
}
