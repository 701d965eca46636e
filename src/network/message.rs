//! Minimal IRC line parsing.
//!
//! Only what the bot needs: optional tags (skipped), optional prefix,
//! command or numeric, and parameters with a trailing `:` parameter.

use crate::hostmask::HostMask;
use std::fmt;
use std::str::FromStr;

/// One parsed IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    /// Message source without the leading `:`.
    pub prefix: Option<String>,
    /// Command name (upper-cased) or three-digit numeric.
    pub command: String,
    pub params: Vec<String>,
}

/// Error for lines with no command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed IRC line: {0:?}")]
pub struct MalformedLine(pub String);

impl IrcLine {
    /// Nick part of the prefix, if the source is a user.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split(['!', '@']).next()?;
        (!nick.is_empty()).then_some(nick)
    }

    /// Full `nick!user@host` source, if the prefix has all three parts.
    pub fn source_mask(&self) -> Option<HostMask> {
        self.prefix.as_deref()?.parse().ok()
    }

    pub fn param(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }
}

impl FromStr for IrcLine {
    type Err = MalformedLine;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest
                .split_once(' ')
                .map(|(_, r)| r)
                .ok_or_else(|| MalformedLine(line.to_string()))?;
            rest = rest.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (p, r) = stripped
                .split_once(' ')
                .ok_or_else(|| MalformedLine(line.to_string()))?;
            prefix = Some(p.to_string());
            rest = r.trim_start_matches(' ');
        }

        let (command, mut rest) = match rest.split_once(' ') {
            Some((c, r)) => (c, r),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(MalformedLine(line.to_string()));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((p, r)) => {
                    params.push(p.to_string());
                    rest = r;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

impl fmt::Display for IrcLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        if let Some((last, init)) = self.params.split_last() {
            for p in init {
                write!(f, " {p}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}

/// Remove characters that would let text break out of a single IRC line.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n' | '\0')).collect()
}

/// Build a `PRIVMSG` line.
pub fn privmsg(target: &str, text: &str) -> String {
    format!("PRIVMSG {} :{}", sanitize(target), sanitize(text))
}

/// Build a `NOTICE` line.
pub fn notice(target: &str, text: &str) -> String {
    format!("NOTICE {} :{}", sanitize(target), sanitize(text))
}

/// Build a `JOIN` line.
pub fn join(channel: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("JOIN {} {}", sanitize(channel), sanitize(key)),
        None => format!("JOIN {}", sanitize(channel)),
    }
}

/// Build a channel `MODE` line granting or revoking `+o`.
pub fn op_mode(channel: &str, nick: &str, grant: bool) -> String {
    let sign = if grant { '+' } else { '-' };
    format!("MODE {} {}o {}", sanitize(channel), sign, sanitize(nick))
}
