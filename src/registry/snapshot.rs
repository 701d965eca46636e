//! On-disk JSON snapshot of the registry.
//!
//! ```json
//! {
//! 	"modified": "2026-10-19T12:00:00Z",
//! 	"channels": {
//! 		"#chan": { "wmsg": "Welcome back, {nick}", "ops": { "alice": ["alice!*@host"] } }
//! 	}
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Whole-registry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub modified: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: BTreeMap<String, ChannelSnapshot>,
}

/// One channel in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub wmsg: String,
    #[serde(default, deserialize_with = "ops_tolerating_null")]
    pub ops: BTreeMap<String, Vec<String>>,
}

impl Snapshot {
    /// Serialize with tab indentation and a trailing newline.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// Hand-edited files may carry `"nick": null` for a nick without patterns.
fn ops_tolerating_null<'de, D>(d: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Vec<String>>>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(nick, masks)| (nick, masks.unwrap_or_default()))
        .collect())
}
