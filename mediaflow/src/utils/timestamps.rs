//! Timestamp helpers.

use chrono::Utc;

/// Returns the current UTC time as an ISO 8601 string with microseconds,
/// e.g. `2026-10-18T09:30:00.123456+00:00`.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
