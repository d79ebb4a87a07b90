//! Timestamp normalization shared by all extractors.
//!
//! Sources disagree on how they encode time: epoch milliseconds, epoch
//! seconds, ISO-8601 strings, or nothing at all. Everything funnels through
//! [`normalize_timestamp`], which is pure and total: malformed input
//! normalizes to `None`, never to an error.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Numeric values at or above this are epoch milliseconds; below, seconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e10;

/// Normalize a raw timestamp value into canonical ISO-8601 UTC.
///
/// Strings already carrying a date separator pass through unchanged; bare
/// numeric strings and every other shape normalize to `None`.
pub fn normalize_timestamp(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            if s.contains('T') || s.contains('-') {
                Some(s.clone())
            } else {
                None
            }
        }
        Value::Number(n) => normalize_epoch(n.as_f64()?),
        _ => None,
    }
}

/// Convert an epoch number (seconds or milliseconds, disambiguated by
/// magnitude) to ISO-8601 UTC. Non-finite or out-of-range input yields
/// `None`.
pub fn normalize_epoch(raw: f64) -> Option<String> {
    if !raw.is_finite() {
        return None;
    }
    let millis = if raw >= EPOCH_MILLIS_THRESHOLD { raw } else { raw * 1000.0 };
    if millis <= i64::MIN as f64 || millis >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Probe an object for a timestamp over an ordered list of candidate field
/// names, returning the first candidate that normalizes successfully.
///
/// The candidate lists are a deliberate compatibility shim across producer
/// versions; callers keep them as explicit constants.
pub fn probe_timestamp(obj: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|field| normalize_timestamp(obj.get(*field)))
}
