//! Vehicle journeys: individual scheduled departures.

use std::collections::BTreeMap;

use chrono::Duration;

use crate::calendar::OperatingProfile;
use crate::domain::{ScheduleTime, seconds};

/// Where a journey gets its stop sequence from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneySource {
    /// A journey pattern id.
    JourneyPattern(String),
    /// Another vehicle journey's code, whose pattern is reused.
    VehicleJourney(String),
}

/// Journey-specific timing for one timing link.
///
/// Each field overrides the pattern's value when present.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkOverride {
    pub link: String,
    #[serde(default, with = "seconds::option")]
    pub run_time: Option<Duration>,
    #[serde(default, with = "seconds::option")]
    pub from_wait_time: Option<Duration>,
    #[serde(default, with = "seconds::option")]
    pub to_wait_time: Option<Duration>,
}

impl LinkOverride {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            run_time: None,
            from_wait_time: None,
            to_wait_time: None,
        }
    }
}

/// One scheduled departure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VehicleJourney {
    pub code: String,
    /// Operator's own reference, shown in column headings when present.
    #[serde(default)]
    pub private_code: Option<String>,
    /// Public line name, when the document carries more than one.
    #[serde(default)]
    pub line: Option<String>,
    pub departure_time: ScheduleTime,
    pub source: JourneySource,
    #[serde(default)]
    pub link_overrides: Vec<LinkOverride>,
    /// Timing link at which passenger service begins.
    #[serde(default)]
    pub start_dead_run: Option<String>,
    /// Timing link at which passenger service ends.
    #[serde(default)]
    pub end_dead_run: Option<String>,
    #[serde(default)]
    pub operating_profile: Option<OperatingProfile>,
    /// Free-text notes keyed by a short code.
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

impl VehicleJourney {
    pub fn new(
        code: impl Into<String>,
        departure_time: ScheduleTime,
        source: JourneySource,
    ) -> Self {
        Self {
            code: code.into(),
            private_code: None,
            line: None,
            departure_time,
            source,
            link_overrides: Vec::new(),
            start_dead_run: None,
            end_dead_run: None,
            operating_profile: None,
            notes: BTreeMap::new(),
        }
    }

    /// Shorthand for a journey following a pattern directly.
    pub fn on_pattern(
        code: impl Into<String>,
        departure_time: ScheduleTime,
        pattern: impl Into<String>,
    ) -> Self {
        Self::new(code, departure_time, JourneySource::JourneyPattern(pattern.into()))
    }

    pub fn with_note(mut self, code: impl Into<String>, text: impl Into<String>) -> Self {
        self.notes.insert(code.into(), text.into());
        self
    }
}
