//! Timetable time handling.
//!
//! GTFS gives times as "HH:MM:SS" strings measured from midnight of the
//! service day. Hours are not bounded by 23: a trip that continues past
//! midnight keeps counting ("25:10:00"). This module provides two types:
//!
//! - [`ServiceTime`]: seconds since service-day midnight, never wrapped. All
//!   scheduling arithmetic (travel times, the connection scan) uses it.
//! - [`ClockTime`]: a same-day wall clock value in `[00:00:00, 24:00:00)`.
//!   Realtime actual times are shown as clock times, so delay arithmetic
//!   wraps around midnight.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A scheduled time, in seconds since midnight of the service day.
///
/// Values of 24:00:00 and above represent service continuing past midnight
/// and are kept as-is: comparison and subtraction never wrap.
///
/// # Examples
///
/// ```
/// use transit_planner::domain::ServiceTime;
///
/// let t = ServiceTime::parse_hhmmss("25:10:00").unwrap();
/// assert_eq!(t.as_secs(), 25 * 3600 + 600);
/// assert_eq!(t.to_string(), "25:10:00");
/// assert_eq!(t.to_clock().to_string(), "01:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create a time from seconds since service-day midnight.
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create a time from hours, minutes and seconds.
    ///
    /// Hours may exceed 23.
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse a GTFS "HH:MM:SS" time.
    ///
    /// The hour field has one or more digits and is unbounded; minutes and
    /// seconds are exactly two digits in 00-59. Surrounding whitespace is
    /// ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse_hhmmss("08:00:00").is_ok());
    /// assert!(ServiceTime::parse_hhmmss("8:00:00").is_ok());
    /// assert!(ServiceTime::parse_hhmmss("26:59:59").is_ok());
    ///
    /// assert!(ServiceTime::parse_hhmmss("08:00").is_err());
    /// assert!(ServiceTime::parse_hhmmss("08:60:00").is_err());
    /// assert!(ServiceTime::parse_hhmmss("").is_err());
    /// ```
    pub fn parse_hhmmss(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS"));
        };

        if h.is_empty() || h.len() > 3 || !h.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new("invalid hour digits"));
        }
        let hours: u32 = h
            .parse()
            .map_err(|_| TimeError::new("invalid hour digits"))?;

        let minutes =
            parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds =
            parse_two_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Returns the number of seconds since service-day midnight.
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Returns the hour component (may exceed 23).
    pub fn hours(self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute component (0-59).
    pub fn minutes(self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// Returns the second component (0-59).
    pub fn seconds(self) -> u32 {
        self.0 % 60
    }

    /// Returns `self - earlier` in seconds, negative if `earlier` is later.
    pub fn signed_secs_since(self, earlier: ServiceTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }

    /// Returns the signed duration between two times.
    pub fn signed_duration_since(self, earlier: ServiceTime) -> Duration {
        Duration::seconds(self.signed_secs_since(earlier))
    }

    /// Add seconds, returning `None` on overflow.
    pub fn checked_add_secs(self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Apply a realtime delay, producing a same-day clock time.
    ///
    /// Delays may be negative for early running. The result wraps around
    /// midnight in both directions.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::ServiceTime;
    ///
    /// let t = ServiceTime::parse_hhmmss("14:30:00").unwrap();
    /// assert_eq!(t.with_delay(300).to_string(), "14:35:00");
    /// assert_eq!(t.with_delay(-120).to_string(), "14:28:00");
    ///
    /// let late = ServiceTime::parse_hhmmss("23:50:00").unwrap();
    /// assert_eq!(late.with_delay(1200).to_string(), "00:10:00");
    /// ```
    pub fn with_delay(self, delay_secs: i32) -> ClockTime {
        ClockTime::from_secs_wrapping(i64::from(self.0) + i64::from(delay_secs))
    }

    /// Returns this time as a same-day clock time (wrapping past midnight).
    pub fn to_clock(self) -> ClockTime {
        self.with_delay(0)
    }
}

impl FromStr for ServiceTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hhmmss(s)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// A wall clock time of day, always in `[00:00:00, 24:00:00)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u32);

impl ClockTime {
    /// Create a clock time from any number of seconds, wrapping into one day.
    pub fn from_secs_wrapping(secs: i64) -> Self {
        // rem_euclid keeps the result non-negative and below one day
        Self(secs.rem_euclid(i64::from(SECONDS_PER_DAY)) as u32)
    }

    /// Parse "HH:MM:SS", wrapping hours of 24 and above.
    pub fn parse_hhmmss(s: &str) -> Result<Self, TimeError> {
        ServiceTime::parse_hhmmss(s).map(ServiceTime::to_clock)
    }

    /// Returns seconds since midnight (0..86400).
    pub const fn as_secs(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({self})")
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 % 3600) / 60,
            self.0 % 60
        )
    }
}

/// Format a delay for riders: "5 min delay", "2 min early" or "On time".
///
/// Deviations under a minute count as on time.
pub fn format_delay(delay_secs: i64) -> String {
    let mins = delay_secs.unsigned_abs() / 60;
    if mins == 0 {
        return "On time".to_string();
    }
    if delay_secs > 0 {
        format!("{mins} min delay")
    } else {
        format!("{mins} min early")
    }
}

/// Format a duration as "25m", "1h 5m" or "2h".
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the same service time.
        #[test]
        fn display_parse_roundtrip(secs in 0u32..(48 * 3600)) {
            let time = ServiceTime::from_secs(secs);
            prop_assert_eq!(ServiceTime::parse_hhmmss(&time.to_string()).unwrap(), time);
        }

        /// A delayed clock time is always within one day and congruent to
        /// the unwrapped sum.
        #[test]
        fn delay_stays_within_day(secs in 0u32..(48 * 3600), delay in -86_400i32..86_400) {
            let clock = ServiceTime::from_secs(secs).with_delay(delay);
            prop_assert!(clock.as_secs() < SECONDS_PER_DAY);
            let expected = (i64::from(secs) + i64::from(delay)).rem_euclid(86_400);
            prop_assert_eq!(i64::from(clock.as_secs()), expected);
        }
    }
}
