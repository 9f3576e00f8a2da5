//! Compact human-readable durations for status messages.

use core::fmt::Write;

/// Format a number of seconds as `1h2m3s`.
///
/// Leading zero units are dropped (`65` → `1m5s`), inner ones are kept
/// (`3600` → `1h0m0s`), and zero is `0s`. Negative inputs get a leading `-`.
pub fn format_seconds(seconds: i64) -> String {
    let mut out = String::new();
    if seconds < 0 {
        out.push('-');
    }
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    // Writing into a String cannot fail.
    let _ = if hours > 0 {
        write!(out, "{}h{}m{}s", hours, minutes, secs)
    } else if minutes > 0 {
        write!(out, "{}m{}s", minutes, secs)
    } else {
        write!(out, "{}s", secs)
    };
    out
}
