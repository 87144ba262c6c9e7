//! Coarse human-readable durations for rate-limit wait messages.
//!
//! Picks the largest unit the duration reaches and rounds to it, so 90 seconds
//! renders as "2 minutes" and 1.4 hours as "1 hour".

use std::time::Duration;

const SECOND: u128 = 1_000;
const MINUTE: u128 = SECOND * 60;
const HOUR: u128 = MINUTE * 60;
const DAY: u128 = HOUR * 24;

/// Formats a duration as a coarse, single-unit string ("2 minutes", "30 seconds").
///
/// Durations under one second are rendered in milliseconds.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();

    // Each unit is chosen on the value rounded to the next smaller unit, so
    // 59.6 seconds reads "1 minute" rather than "60 seconds".
    let units = [
        (DAY, HOUR, "day"),
        (HOUR, MINUTE, "hour"),
        (MINUTE, SECOND, "minute"),
        (SECOND, 1, "second"),
    ];
    for (unit, precision, name) in units {
        if round_to(ms, precision) >= unit {
            return plural(ms, unit, name);
        }
    }

    format!("{ms} ms")
}

const fn round_to(ms: u128, precision: u128) -> u128 {
    (ms + precision / 2) / precision * precision
}

fn plural(ms: u128, unit: u128, name: &str) -> String {
    // Round half up; pluralise once we're at least 1.5 units in.
    let rounded = (ms + unit / 2) / unit;
    let suffix = if ms * 2 >= unit * 3 { "s" } else { "" };
    format!("{rounded} {name}{suffix}")
}
