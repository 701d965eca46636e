//! MASK command handler.
//!
//! - `mask add <nick> <hostmask>`: accept another pattern for `nick`
//! - `mask del <nick> <hostmask>`: drop one pattern
//! - `mask clear <nick>`: drop every pattern, keep the nick
//! - `mask ls <nick>`: list patterns

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};
use tracing::info;

impl OpBot {
    pub(super) fn handle_mask(&self, channel: &str, args: &[&str]) -> CommandReply {
        let usage = || {
            CommandReply::ok(format!(
                "{REPLY_PREFIX}: Usage: mask <add|del|clear|ls> <nick> [hostmask]"
            ))
        };
        let (Some(sub), Some(nick)) = (args.first(), args.get(1)) else {
            return usage();
        };
        let mask = args.get(2).copied();
        let registry = self.registry();

        match (sub.to_ascii_uppercase().as_str(), mask) {
            ("ADD", Some(mask)) => {
                if !registry.add(channel, nick, mask) {
                    return CommandReply::ok(format!(
                        "{REPLY_PREFIX}: Hostmask {mask} already registered for {nick}"
                    ));
                }
                info!(channel = %channel, nick = %nick, mask = %mask, "Hostmask added");
                CommandReply::saved(
                    format!("{REPLY_PREFIX}: Hostmask {mask} added for {nick}"),
                    self.store.persist(),
                )
            }
            ("DEL", Some(mask)) => {
                if !registry.remove_hostmask(channel, nick, mask) {
                    return CommandReply::ok(format!(
                        "{REPLY_PREFIX}: Hostmask {mask} not registered for {nick}"
                    ));
                }
                info!(channel = %channel, nick = %nick, mask = %mask, "Hostmask removed");
                CommandReply::saved(
                    format!("{REPLY_PREFIX}: Hostmask {mask} removed for {nick}"),
                    self.store.persist(),
                )
            }
            ("CLEAR", _) => {
                if !registry.clear_hostmasks(channel, nick) {
                    return CommandReply::ok(format!(
                        "{REPLY_PREFIX}: {nick} is NOT registered as OP"
                    ));
                }
                info!(channel = %channel, nick = %nick, "Hostmasks cleared");
                CommandReply::saved(
                    format!("{REPLY_PREFIX}: Hostmasks cleared for {nick}"),
                    self.store.persist(),
                )
            }
            ("LS", _) => match registry.hostmasks(channel, nick) {
                None => CommandReply::ok(format!("{REPLY_PREFIX}: {nick} is NOT registered as OP")),
                Some(masks) if masks.is_empty() => {
                    CommandReply::ok(format!("{REPLY_PREFIX}: No hostmasks for {nick}"))
                }
                Some(masks) => CommandReply::ok(format!(
                    "{REPLY_PREFIX}: Hostmasks for {nick}: {}",
                    masks.join(", ")
                )),
            },
            _ => usage(),
        }
    }
}
