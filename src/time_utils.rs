// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Absolute expiry for a token that lives `expires_in` seconds from `now`.
///
/// `None` if the result is outside chrono's representable range.
pub fn expiration_after(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(expires_in).and_then(|delta| now.checked_add_signed(delta))
}
