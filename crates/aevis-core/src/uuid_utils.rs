//! UUIDv7 utilities for time-ordered identifiers.
//!
//! Observation and run correlation ids are UUIDv7: the embedded
//! millisecond timestamp makes them sort chronologically, which keeps the
//! append-only observation log naturally ordered and log correlation cheap.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// UUIDv7 embeds a Unix timestamp (milliseconds) in the first 48 bits,
/// providing natural time-ordering.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}

/// Extract the embedded timestamp from a UUIDv7.
///
/// Returns `None` for non-v7 UUIDs.
pub fn extract_timestamp(id: &Uuid) -> Option<DateTime<Utc>> {
    if !is_v7(id) {
        return None;
    }

    let bytes = id.as_bytes();
    let mut millis: u64 = 0;
    for byte in bytes.iter().take(6) {
        millis = (millis << 8) | u64::from(*byte);
    }

    Utc.timestamp_millis_opt(millis as i64).single()
}
