//! Stop identity and display attributes.

use std::fmt;

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// A stable stop code, such as an ATCO code ("490000077E").
///
/// Codes are non-empty and contain no whitespace. This type guarantees
/// that any `StopCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use timetable_engine::domain::StopCode;
///
/// let code = StopCode::parse("0100BRP90310").unwrap();
/// assert_eq!(code.as_str(), "0100BRP90310");
///
/// assert!(StopCode::parse("").is_err());
/// assert!(StopCode::parse("0100 BRP").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    /// Parse a stop code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(InvalidStopCode {
                reason: "must not contain whitespace",
            });
        }

        Ok(StopCode(s.to_string()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.0)
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StopCode {
    type Error = InvalidStopCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(value: StopCode) -> Self {
        value.0
    }
}

/// A stop as it appears in the schedule document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stop {
    pub code: StopCode,
    pub common_name: String,
    #[serde(default)]
    pub locality: Option<String>,
    /// Short qualifier such as "opp" or "Stand B".
    #[serde(default)]
    pub indicator: Option<String>,
}

impl Stop {
    /// Creates a stop with just a code and common name.
    pub fn new(code: StopCode, common_name: impl Into<String>) -> Self {
        Self {
            code,
            common_name: common_name.into(),
            locality: None,
            indicator: None,
        }
    }

    /// Name for a timetable row heading.
    ///
    /// The locality is dropped when the common name already mentions it.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_engine::domain::{Stop, StopCode};
    ///
    /// let mut stop = Stop::new(StopCode::parse("X1").unwrap(), "High Street");
    /// stop.locality = Some("Ashford".into());
    /// stop.indicator = Some("Stand B".into());
    /// assert_eq!(stop.display_name(), "Ashford High Street (Stand B)");
    /// ```
    pub fn display_name(&self) -> String {
        let mut name = match &self.locality {
            Some(locality) if !self.common_name.contains(locality.as_str()) => {
                format!("{} {}", locality, self.common_name)
            }
            _ => self.common_name.clone(),
        };
        if let Some(indicator) = &self.indicator {
            name.push_str(&format!(" ({indicator})"));
        }
        name
    }
}
