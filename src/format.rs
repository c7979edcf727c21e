//! Human-readable countdown formatting.

use chrono::Duration;

/// Formats a duration as `MM:SS`, clamping negatives to `00:00`.
///
/// Durations of an hour or more keep accumulating minutes (`90:00`).
///
/// # Example
///
/// ```rust
/// use chrono::Duration;
///
/// assert_eq!(wicket::format::clock(Duration::seconds(299)), "04:59");
/// assert_eq!(wicket::format::clock(Duration::seconds(-3)), "00:00");
/// ```
#[must_use]
pub fn clock(duration: Duration) -> String {
    clock_secs(duration.num_seconds())
}

/// Formats a number of seconds as `MM:SS`, clamping negatives to `00:00`.
#[must_use]
pub fn clock_secs(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
