//! LS command handler.

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};

impl OpBot {
    /// `ls [nick]`: list the channel's ops, or check a single nick.
    pub(super) fn handle_ls(&self, channel: &str, args: &[&str]) -> CommandReply {
        let registry = self.registry();
        if registry.is_empty(channel) {
            return CommandReply::ok(format!(
                "{REPLY_PREFIX}: No configured OPs for channel {channel}"
            ));
        }

        match args.first() {
            None => CommandReply::ok(format!(
                "{REPLY_PREFIX}: OPs for {channel}: {}",
                registry.list_nicks(channel).join(", ")
            )),
            Some(nick) if registry.has(channel, nick) => {
                CommandReply::ok(format!("{REPLY_PREFIX}: {nick} is registered as OP"))
            }
            Some(nick) => {
                CommandReply::ok(format!("{REPLY_PREFIX}: {nick} is NOT registered as OP"))
            }
        }
    }
}
