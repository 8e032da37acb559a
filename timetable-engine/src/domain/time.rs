//! Schedule time handling.
//!
//! Schedule documents express departure times as an offset from midnight of
//! the operating day. Journeys that run past midnight keep counting, so an
//! offset may exceed 24 hours ("25:10" is ten past one the next morning).

use chrono::Duration;
use std::fmt;
use std::ops::Add;

const SECS_PER_MINUTE: u32 = 60;
const SECS_PER_HOUR: u32 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;

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

/// A time of day within an operating day, allowed to run past midnight.
///
/// # Examples
///
/// ```
/// use timetable_engine::domain::ScheduleTime;
///
/// let t = ScheduleTime::parse("09:20").unwrap();
/// assert_eq!(t.to_string(), "09:20");
///
/// let late = ScheduleTime::parse("25:10").unwrap();
/// assert!(late.is_next_day());
/// assert_eq!(late.to_string(), "01:10");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleTime {
    secs: u32,
}

impl ScheduleTime {
    /// Midnight at the start of the operating day.
    pub const MIDNIGHT: Self = Self { secs: 0 };

    /// Create a time from hour, minute and second components.
    ///
    /// Hours may exceed 23 for journeys continuing past midnight. Saturates
    /// at the largest representable offset.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        let secs = hour
            .saturating_mul(SECS_PER_HOUR)
            .saturating_add(minute.saturating_mul(SECS_PER_MINUTE))
            .saturating_add(second);
        Self { secs }
    }

    /// Parse a time from "HH:MM" or "HH:MM:SS".
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_engine::domain::ScheduleTime;
    ///
    /// assert!(ScheduleTime::parse("00:00").is_ok());
    /// assert!(ScheduleTime::parse("23:59:30").is_ok());
    /// assert!(ScheduleTime::parse("26:15").is_ok());
    ///
    /// assert!(ScheduleTime::parse("0915").is_err());
    /// assert!(ScheduleTime::parse("09:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Hours since the start of the operating day (may be 24 or more).
    pub fn hour(&self) -> u32 {
        self.secs / SECS_PER_HOUR
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.secs % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.secs % SECS_PER_MINUTE
    }

    /// True when the time falls on the day after the operating day.
    pub fn is_next_day(&self) -> bool {
        self.secs >= SECS_PER_DAY
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::seconds(i64::from(self.secs) - i64::from(other.secs))
    }
}

impl Add<Duration> for ScheduleTime {
    type Output = Self;

    /// Saturates at midnight and at the largest representable offset.
    fn add(self, rhs: Duration) -> Self::Output {
        let secs = i64::from(self.secs).saturating_add(rhs.num_seconds());
        Self {
            secs: secs.clamp(0, i64::from(u32::MAX)) as u32,
        }
    }
}

impl fmt::Debug for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScheduleTime({:02}:{:02}:{:02})",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour() % 24, self.minute())
    }
}

impl TryFrom<String> for ScheduleTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScheduleTime> for String {
    fn from(value: ScheduleTime) -> Self {
        format!(
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        )
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

/// Serde helpers for durations written as whole seconds.
pub mod seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u32::deserialize(deserializer)?;
        Ok(Duration::seconds(i64::from(secs)))
    }

    /// Same encoding for optional durations; absent stays absent.
    pub mod option {
        use chrono::Duration;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_some(&d.num_seconds()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            let secs = Option::<u32>::deserialize(deserializer)?;
            Ok(secs.map(|s| Duration::seconds(i64::from(s))))
        }
    }
}
