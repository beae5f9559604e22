//! Event identity: the directory name derived from an event's timestamp.
//!
//! Identities are fixed-width and sort lexicographically in the same order
//! as the timestamps they encode. Their precision is whole seconds, so two
//! timestamps within the same second share an identity.

use chrono::{NaiveDateTime, Timelike};

/// `strftime` format of event identities, e.g. `2024-01-01-00:00:00`.
pub const ID_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Encode a naive UTC timestamp as an event identity.
#[must_use]
pub fn format_id(timestamp: &NaiveDateTime) -> String {
    timestamp.format(ID_FORMAT).to_string()
}

/// Decode an event identity.
///
/// Only canonical encodings are accepted: the string must re-encode to
/// exactly itself, so `2024-1-1-0:0:0` is rejected.
#[must_use]
pub fn parse_id(id: &str) -> Option<NaiveDateTime> {
    let timestamp = NaiveDateTime::parse_from_str(id, ID_FORMAT).ok()?;
    (format_id(&timestamp) == id).then_some(timestamp)
}

/// Drop precision the identity format cannot carry.
#[must_use]
pub fn truncate_to_id_precision(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
