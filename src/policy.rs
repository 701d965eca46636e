//! Authorization policy for bot commands.
//!
//! Decision order:
//! 1. A channel with no authorized nicks accepts every command. Without this
//!    nobody could add the first op.
//! 2. An authorized caller is accepted when no speaker has been tracked yet,
//!    when the tracked speaker is someone else (the hostmask cannot be
//!    checked reliably), or when the tracked hostmask matches the caller's
//!    patterns.
//! 3. Anyone may run read-only commands: `ls`, `wmsg get` and `mask ls`.

use crate::caller::CallerState;
use crate::registry::Registry;
use std::fmt;

/// Why a command was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// The channel has no authorized nicks yet.
    Bootstrap,
    /// Caller is authorized but no speaker has been tracked.
    NoCallerSeen,
    /// Caller is authorized but the tracked speaker is a different nick.
    CallerOutOfSync,
    /// Caller is authorized and the tracked hostmask matched.
    HostmaskMatched,
    /// The command does not modify anything.
    ReadOnly,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow(AllowReason),
    Deny,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allow(_))
    }
}

impl fmt::Display for AllowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bootstrap => "bootstrap",
            Self::NoCallerSeen => "no_caller_seen",
            Self::CallerOutOfSync => "caller_out_of_sync",
            Self::HostmaskMatched => "hostmask_matched",
            Self::ReadOnly => "read_only",
        })
    }
}

/// True for commands that only read the registry.
pub fn is_read_only(verb: &str, first_arg: &str) -> bool {
    if verb.eq_ignore_ascii_case("ls") {
        return true;
    }
    if verb.eq_ignore_ascii_case("wmsg") {
        return first_arg.eq_ignore_ascii_case("get");
    }
    if verb.eq_ignore_ascii_case("mask") {
        return first_arg.eq_ignore_ascii_case("ls");
    }
    false
}

/// Decide whether `caller_nick` may run `verb` in `channel`.
pub fn authorize(
    registry: &Registry,
    caller: Option<&CallerState>,
    channel: &str,
    caller_nick: &str,
    verb: &str,
    first_arg: &str,
) -> Verdict {
    if registry.is_empty(channel) {
        return Verdict::Allow(AllowReason::Bootstrap);
    }

    if registry.has(channel, caller_nick) {
        match caller {
            None => return Verdict::Allow(AllowReason::NoCallerSeen),
            Some(seen) if seen.nick != caller_nick => {
                return Verdict::Allow(AllowReason::CallerOutOfSync);
            }
            Some(seen) => {
                if registry.match_hostmask(channel, caller_nick, &seen.hostmask) {
                    return Verdict::Allow(AllowReason::HostmaskMatched);
                }
            }
        }
    }

    if is_read_only(verb, first_arg) {
        return Verdict::Allow(AllowReason::ReadOnly);
    }
    Verdict::Deny
}

/// Boolean form of [`authorize`].
pub fn is_allowed(
    registry: &Registry,
    caller: Option<&CallerState>,
    channel: &str,
    caller_nick: &str,
    verb: &str,
    first_arg: &str,
) -> bool {
    authorize(registry, caller, channel, caller_nick, verb, first_arg).is_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EmptyMaskPolicy;

    fn seen(nick: &str, hostmask: &str) -> CallerState {
        CallerState {
            nick: nick.into(),
            hostmask: hostmask.into(),
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new(EmptyMaskPolicy::Deny);
        registry.add("#chan", "alice", "alice!a@host1");
        registry
    }

    #[test]
    fn test_empty_channel_bootstraps() {
        let registry = Registry::new(EmptyMaskPolicy::Deny);
        assert_eq!(
            authorize(&registry, None, "#chan", "mallory", "add", "mallory"),
            Verdict::Allow(AllowReason::Bootstrap)
        );
    }

    #[test]
    fn test_authorized_caller_branches() {
        let registry = registry();

        assert_eq!(
            authorize(&registry, None, "#chan", "alice", "del", "bob"),
            Verdict::Allow(AllowReason::NoCallerSeen)
        );
        let other = seen("bob", "bob!b@host2");
        assert_eq!(
            authorize(&registry, Some(&other), "#chan", "alice", "del", "bob"),
            Verdict::Allow(AllowReason::CallerOutOfSync)
        );
        let good = seen("alice", "alice!a@host1");
        assert_eq!(
            authorize(&registry, Some(&good), "#chan", "alice", "del", "bob"),
            Verdict::Allow(AllowReason::HostmaskMatched)
        );
        let spoofed = seen("alice", "alice!x@evil.example");
        assert_eq!(
            authorize(&registry, Some(&spoofed), "#chan", "alice", "del", "bob"),
            Verdict::Deny
        );
        assert_eq!(
            authorize(&registry, Some(&spoofed), "#chan", "alice", "ls", ""),
            Verdict::Allow(AllowReason::ReadOnly)
        );
    }

    #[test]
    fn test_authorized_caller_with_empty_masks() {
        let registry = registry();
        registry.clear_hostmasks("#chan", "alice");
        let me = seen("alice", "alice!a@host1");
        assert!(!is_allowed(&registry, Some(&me), "#chan", "alice", "add", "bob"));

        let allow = Registry::new(EmptyMaskPolicy::Allow);
        allow.add("#chan", "alice", "alice!a@host1");
        allow.clear_hostmasks("#chan", "alice");
        assert!(is_allowed(&allow, Some(&me), "#chan", "alice", "add", "bob"));
    }

    #[test]
    fn test_unauthorized_caller_read_only() {
        let registry = registry();
        let me = seen("mallory", "mallory!m@host9");

        for (verb, arg) in [("ls", ""), ("LS", "alice"), ("wmsg", "get"), ("MASK", "LS")] {
            assert!(
                is_allowed(&registry, Some(&me), "#chan", "mallory", verb, arg),
                "{verb} {arg} should be allowed"
            );
        }
        for (verb, arg) in [
            ("add", "mallory"),
            ("del", "alice"),
            ("wmsg", "set"),
            ("mask", "add"),
            ("mask", "clear"),
            ("reload", ""),
            ("clear", ""),
            ("get", ""),
        ] {
            assert!(
                !is_allowed(&registry, Some(&me), "#chan", "mallory", verb, arg),
                "{verb} {arg} should be denied"
            );
        }
    }
}
