//! WMSG command handler.

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};
use tracing::info;

impl OpBot {
    /// `wmsg get` or `wmsg set <message...>`.
    pub(super) fn handle_wmsg(&self, channel: &str, args: &[&str]) -> CommandReply {
        let usage = || CommandReply::ok(format!("{REPLY_PREFIX}: Usage: wmsg <get|set> [message]"));
        let Some(sub) = args.first() else {
            return usage();
        };

        if sub.eq_ignore_ascii_case("get") {
            // An empty nick returns the raw template.
            let template = self.registry().get_welcome(channel, "");
            return if template.is_empty() {
                CommandReply::ok(format!("{REPLY_PREFIX}: No welcome message set for {channel}"))
            } else {
                CommandReply::ok(format!(
                    "{REPLY_PREFIX}: Welcome message for {channel}: {template}"
                ))
            };
        }

        if sub.eq_ignore_ascii_case("set") {
            let message = args[1..].join(" ");
            if message.is_empty() {
                return CommandReply::ok(format!(
                    "{REPLY_PREFIX}: Cannot set empty welcome message"
                ));
            }
            self.registry().set_welcome(channel, &message);
            info!(channel = %channel, "Welcome message updated");
            return CommandReply::saved(
                format!("{REPLY_PREFIX}: Welcome message for {channel} set to: {message}"),
                self.store.persist(),
            );
        }

        usage()
    }
}
