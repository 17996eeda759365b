// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC timestamp as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Today's calendar date in UTC.
///
/// All challenge/streak math anchors on this; it is resolved once per
/// request and passed down so the aggregation itself stays pure.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
