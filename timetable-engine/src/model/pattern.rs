//! Journey patterns and their timing links.

use std::fmt;

use chrono::Duration;

use crate::calendar::OperatingProfile;
use crate::domain::{StopCode, seconds};

/// What passengers may do at a stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    PickUpAndSetDown,
    /// Boarding only.
    PickUp,
    /// Alighting only.
    SetDown,
    Pass,
}

/// Whether a stop is a principal timing point or a minor one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStatus {
    #[default]
    Principal,
    Other,
}

/// One end of a timing link: a stop visited by the pattern.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StopUsage {
    pub stop: StopCode,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub timing_status: TimingStatus,
    /// Dwell at the stop. Absent means no dwell was specified.
    #[serde(default, with = "seconds::option")]
    pub wait_time: Option<Duration>,
    #[serde(default)]
    pub sequence_number: Option<u32>,
}

impl StopUsage {
    pub fn new(stop: StopCode) -> Self {
        Self {
            stop,
            activity: Activity::default(),
            timing_status: TimingStatus::default(),
            wait_time: None,
            sequence_number: None,
        }
    }

    pub fn is_minor(&self) -> bool {
        self.timing_status == TimingStatus::Other
    }
}

/// A directed stop-to-stop segment with a nominal run time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimingLink {
    pub id: String,
    pub from: StopUsage,
    pub to: StopUsage,
    #[serde(with = "seconds")]
    pub run_time: Duration,
}

impl TimingLink {
    pub fn new(id: impl Into<String>, from: StopUsage, to: StopUsage, run_time: Duration) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            run_time,
        }
    }
}

/// Direction of travel for a pattern.
///
/// Documents use a free-form string; anything that isn't recognisably
/// inbound is treated as outbound.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
}

impl From<&str> for Direction {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "inbound" | "anticlockwise" | "anti-clockwise" => Direction::Inbound,
            _ => Direction::Outbound,
        }
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Direction::from(value.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("outbound"),
            Direction::Inbound => f.write_str("inbound"),
        }
    }
}

/// A reusable stop sequence shared by many vehicle journeys.
///
/// The links are the concatenation of the pattern's sections. Stop usages
/// are numbered by position: position `i` is the origin of link `i`, and
/// the final position is the destination of the last link.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JourneyPattern {
    pub id: String,
    #[serde(default)]
    pub direction: Direction,
    pub links: Vec<TimingLink>,
    #[serde(default)]
    pub operating_profile: Option<OperatingProfile>,
}

impl JourneyPattern {
    pub fn new(id: impl Into<String>, direction: Direction, links: Vec<TimingLink>) -> Self {
        Self {
            id: id.into(),
            direction,
            links,
            operating_profile: None,
        }
    }

    /// Stop usages in visiting order, one per position.
    pub fn stop_usages(&self) -> impl Iterator<Item = &StopUsage> {
        self.links
            .iter()
            .map(|link| &link.from)
            .chain(self.links.last().map(|link| &link.to))
    }

    /// Number of positions (links plus one; zero for an empty pattern).
    pub fn stop_count(&self) -> usize {
        if self.links.is_empty() {
            0
        } else {
            self.links.len() + 1
        }
    }

    /// True when every stop usage carries an explicit sequence number.
    pub fn has_sequence_numbers(&self) -> bool {
        !self.links.is_empty() && self.stop_usages().all(|u| u.sequence_number.is_some())
    }

    /// Links whose id is `id`.
    pub fn links_with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a TimingLink> + 'a {
        self.links.iter().filter(move |link| link.id == id)
    }
}
