//! The parsed schedule document handed to the engine.
//!
//! Decoding the XML wire format is someone else's job; this module accepts
//! the decoded entity model, either built in code or read from JSON.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::calendar::{DateRange, OperatingProfile};
use crate::domain::{Stop, StopCode};

use super::{JourneyPattern, VehicleJourney};

/// Errors reading a document at the JSON boundary.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Reading the file failed
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON didn't match the entity model
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One service's stops, patterns and journeys.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub journey_patterns: Vec<JourneyPattern>,
    #[serde(default)]
    pub vehicle_journeys: Vec<VehicleJourney>,
    /// Dates the service is registered for; absent means unbounded.
    #[serde(default)]
    pub operating_period: Option<DateRange>,
    /// Service-wide default calendar.
    #[serde(default)]
    pub operating_profile: Option<OperatingProfile>,
}

impl Document {
    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, DocumentError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    /// Lookup table from stop code to stop. The first stop wins on duplicates.
    pub fn stops_by_code(&self) -> HashMap<&StopCode, &Stop> {
        let mut stops = HashMap::with_capacity(self.stops.len());
        for stop in &self.stops {
            stops.entry(&stop.code).or_insert(stop);
        }
        stops
    }
}
