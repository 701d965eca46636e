//! OPBot command handlers.

mod admin;
mod get;
mod list;
mod mask;
mod ops;
mod wmsg;

use super::{OpBot, REPLY_PREFIX};
use crate::error::RegistryError;
use crate::policy::{self, Verdict};
use crate::telemetry::spans;
use std::sync::Arc;
use tracing::{Instrument, debug, error, warn};

/// Reply to a command: text for the channel plus a persistence error, if
/// the command changed state that could not be saved.
#[derive(Debug)]
pub struct CommandReply {
    pub text: String,
    pub error: Option<RegistryError>,
}

impl CommandReply {
    pub(crate) fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    /// Reply that reports a save result. In-memory changes stay applied
    /// either way.
    pub(crate) fn saved(text: impl Into<String>, result: Result<(), RegistryError>) -> Self {
        let mut text = text.into();
        let error = match result {
            Ok(()) => None,
            Err(e) => {
                error!(error = %e, code = e.error_code(), "Failed to save OPs list");
                text.push_str(&format!(" (not saved: {e})"));
                Some(e)
            }
        };
        Self { text, error }
    }
}

/// Command verbs, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Ls,
    Add,
    Del,
    Wmsg,
    Mask,
    Get,
    Reload,
    Clear,
}

impl Verb {
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word.to_ascii_uppercase().as_str() {
            "LS" => Self::Ls,
            "ADD" => Self::Add,
            "DEL" => Self::Del,
            "WMSG" => Self::Wmsg,
            "MASK" => Self::Mask,
            "GET" => Self::Get,
            "RELOAD" => Self::Reload,
            "CLEAR" => Self::Clear,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ls => "ls",
            Self::Add => "add",
            Self::Del => "del",
            Self::Wmsg => "wmsg",
            Self::Mask => "mask",
            Self::Get => "get",
            Self::Reload => "reload",
            Self::Clear => "clear",
        }
    }
}

/// Usage text for every verb.
pub fn help_text(trigger: &str) -> String {
    format!(
        "{REPLY_PREFIX}: Usage: {trigger} <command>\n\
         \x20 add   <nick>\n\
         \x20 del   <nick>\n\
         \x20 ls    [nick]\n\
         \x20 wmsg  <get|set> [message]  ({{nick}} is replaced by the joining nick)\n\
         \x20 mask  <add|del|clear|ls> <nick> [hostmask]\n\
         \x20 get\n\
         \x20 reload\n\
         \x20 clear"
    )
}

impl OpBot {
    /// Run one command for `caller_nick` in `channel`.
    ///
    /// `argv` excludes the trigger word. A missing or unknown verb yields the
    /// help text. Everything else goes through the authorization policy
    /// first.
    pub async fn dispatch(
        self: &Arc<Self>,
        channel: &str,
        caller_nick: &str,
        argv: &[&str],
    ) -> CommandReply {
        let Some(verb) = argv.first().and_then(|w| Verb::parse(w)) else {
            return CommandReply::ok(help_text(&self.trigger));
        };
        let args = &argv[1..];
        let span = spans::command(verb.as_str(), channel, caller_nick);

        async move {
            let first_arg = args.first().copied().unwrap_or_default();
            let caller = self.tracker.snapshot();
            let verdict = policy::authorize(
                &self.registry(),
                caller.as_ref(),
                channel,
                caller_nick,
                verb.as_str(),
                first_arg,
            );
            match verdict {
                Verdict::Deny => {
                    warn!("Command denied");
                    return CommandReply::ok(format!(
                        "{REPLY_PREFIX}: {caller_nick} is not allowed to run \"{}\" in {channel}",
                        verb.as_str()
                    ));
                }
                Verdict::Allow(reason) => debug!(reason = %reason, "Command allowed"),
            }

            match verb {
                Verb::Ls => self.handle_ls(channel, args),
                Verb::Add => self.handle_add(channel, args),
                Verb::Del => self.handle_del(channel, args).await,
                Verb::Wmsg => self.handle_wmsg(channel, args),
                Verb::Mask => self.handle_mask(channel, args),
                Verb::Get => self.handle_get(channel, caller_nick),
                Verb::Reload => self.handle_reload(),
                Verb::Clear => self.handle_clear(),
            }
        }
        .instrument(span)
        .await
    }
}
