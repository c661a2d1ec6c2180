//! Date header timestamps.

use chrono::{DateTime, FixedOffset, Local};

/// `Date` header format: RFC 1123 with a numeric zone offset
/// (`Mon, 02 Jan 2006 15:04:05 -0700`).
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Source of the current time for the `Date` header.
pub trait Clock: Send + Sync {
    /// Returns the current time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Clock reading the local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Creates a clock frozen at `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<FixedOffset>) -> Self {
        Self(instant)
    }

    /// Creates a clock from an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp does not parse.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Formats a timestamp for the `Date` header.
#[must_use]
pub fn format_date(instant: &DateTime<FixedOffset>) -> String {
    instant.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_with_offset() {
        let clock = FixedClock::parse("2006-01-02T15:04:05-07:00").unwrap();
        assert_eq!(format_date(&clock.now()), "Mon, 02 Jan 2006 15:04:05 -0700");
    }

    #[test]
    fn test_format_date_positive_offset() {
        let clock = FixedClock::parse("2024-03-09T08:00:00+09:00").unwrap();
        assert_eq!(format_date(&clock.now()), "Sat, 09 Mar 2024 08:00:00 +0900");
    }

    #[test]
    fn test_system_clock_round_trips_through_format() {
        let formatted = format_date(&SystemClock.now());
        assert!(DateTime::parse_from_rfc2822(&formatted).is_ok());
    }
}
