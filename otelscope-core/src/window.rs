// Copyright 2025 Otelscope Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Time window resolution.
//!
//! Lookback windows arrive as compact strings (`"30s"`, `"15m"`, `"2h"`,
//! `"7d"`). Two entry points exist with deliberately different failure
//! policies: [`window_to_millis`] rejects malformed input with
//! [`OtelscopeError::InvalidTimeWindow`] so bad tool input is refused at the
//! boundary, while [`window_to_seconds`] silently falls back to 15 minutes.
//! Call sites depend on the divergence; do not unify the two.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::{OtelscopeError, Result};

/// Fallback applied by [`window_to_seconds`] on malformed input (15 minutes)
pub const DEFAULT_WINDOW_SECONDS: u64 = 900;

/// Parse a `<integer><unit>` window into milliseconds.
///
/// Units: `s`, `m`, `h`, `d`. Malformed input is an error.
pub fn window_to_millis(window: &str) -> Result<u64> {
    parse_window_seconds(window)
        .map(|secs| secs * 1000)
        .ok_or_else(|| OtelscopeError::InvalidTimeWindow(window.to_string()))
}

/// Parse a `<integer><unit>` window into seconds, substituting
/// [`DEFAULT_WINDOW_SECONDS`] on malformed input.
pub fn window_to_seconds(window: &str) -> u64 {
    match parse_window_seconds(window) {
        Some(secs) => secs,
        None => {
            debug!(window, "unparseable time window, falling back to 900s");
            DEFAULT_WINDOW_SECONDS
        }
    }
}

fn parse_window_seconds(window: &str) -> Option<u64> {
    let unit = window.chars().next_back()?;
    let digits = &window[..window.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return None,
    };
    value.checked_mul(multiplier)
}

/// Convert a nanosecond epoch timestamp, carried as a string because it can
/// exceed 53-bit integer range upstream, into an ISO-8601 UTC instant with
/// millisecond precision.
///
/// Unparseable input renders the epoch instant rather than failing the
/// surrounding summary.
pub fn nanos_to_iso8601(nanos: &str) -> String {
    let millis = nanos
        .trim()
        .parse::<i128>()
        .ok()
        .map(|ns| ns / 1_000_000)
        .and_then(|ms| i64::try_from(ms).ok())
        .unwrap_or(0);

    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap_or_default())
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
