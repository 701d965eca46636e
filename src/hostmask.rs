//! Hostmask types and glob matching.
//!
//! A hostmask is the `nick!user@host` triplet the network reports for a
//! connected user. Stored patterns use the same textual form with `*` and `?`
//! wildcards allowed in any segment.

use std::fmt;
use std::str::FromStr;

/// A resolved `nick!user@host` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostMask {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl HostMask {
    /// Create a hostmask from its three components.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }
}

impl fmt::Display for HostMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

/// Error returned when a string is not a `nick!user@host` triplet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a nick!user@host triplet: {0:?}")]
pub struct InvalidHostMask(pub String);

impl FromStr for HostMask {
    type Err = InvalidHostMask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (nick, rest) = s
            .split_once('!')
            .ok_or_else(|| InvalidHostMask(s.to_string()))?;
        let (user, host) = rest
            .split_once('@')
            .ok_or_else(|| InvalidHostMask(s.to_string()))?;
        if nick.is_empty() || user.is_empty() || host.is_empty() {
            return Err(InvalidHostMask(s.to_string()));
        }
        Ok(Self::new(nick, user, host))
    }
}

/// Match a hostmask against a glob pattern.
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Matching is case-sensitive and anchored at both ends.
///
/// ```
/// use slirc_opbot::hostmask::matches;
///
/// assert!(matches("*!*@*", "nick!user@host"));
/// assert!(matches("nick!*ser@*", "nick!user@host"));
/// assert!(matches("nick!*user@*", "nick!user@host"));
/// assert!(!matches("nick!*user@*", "nick!ser@host"));
/// ```
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = candidate.chars().collect();
    glob_match(&pattern, &text)
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let mut p = 0;
    let mut t = 0;
    // Position after the last '*' and the text index it was tried at.
    let mut star_p = None;
    let mut star_t = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star_p = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star_p {
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// Convert a single character to IRC lowercase (RFC 1459 case mapping).
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Convert a nick or channel name to IRC lowercase.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two nicks under RFC 1459 case mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}
