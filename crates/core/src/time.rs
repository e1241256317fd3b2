//! Wall-clock timestamps for checkpoint records

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with microseconds, e.g. `2026-10-19T08:15:02.481516Z`
///
/// The width is fixed, so string order is chronological order.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
