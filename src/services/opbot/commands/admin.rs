//! RELOAD and CLEAR command handlers.

use super::CommandReply;
use crate::services::opbot::{OpBot, REPLY_PREFIX};

impl OpBot {
    /// `reload`: replace in-memory state with the snapshot file.
    pub(super) fn handle_reload(&self) -> CommandReply {
        self.store.reload();
        CommandReply::ok(format!("{REPLY_PREFIX}: OPs DB reloaded"))
    }

    /// `clear`: drop every channel and persist the empty state.
    pub(super) fn handle_clear(&self) -> CommandReply {
        let result = self.store.clear();
        CommandReply::saved(format!("{REPLY_PREFIX}: OPs DB cleared"), result)
    }
}
