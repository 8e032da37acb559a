//! Model error types.
//!
//! These errors are fatal for a single journey: the journey is excluded
//! from the timetable and reported as a diagnostic.

use crate::domain::StopCode;

/// A broken reference or inconsistency found while resolving a journey.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The journey references a pattern that doesn't exist
    #[error("journey pattern {0} not found")]
    UnknownPattern(String),

    /// The journey references a vehicle journey that doesn't exist
    #[error("vehicle journey {0} not found")]
    UnknownJourney(String),

    /// Following vehicle journey references leads back to a journey already visited
    #[error("vehicle journey reference cycle: {}", .0.join(" -> "))]
    ReferenceCycle(Vec<String>),

    /// The pattern visits a stop missing from the document
    #[error("stop {0} not found")]
    UnknownStop(StopCode),

    /// The pattern has no timing links
    #[error("journey pattern {0} has no timing links")]
    EmptyPattern(String),

    /// A dead run marker doesn't identify exactly one timing link
    #[error("dead run marker {link} matches {matches} timing links")]
    DeadRunMarker { link: String, matches: usize },
}

/// A journey excluded from the timetable, and why.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct JourneyDiagnostic {
    pub journey: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ModelError,
}

impl JourneyDiagnostic {
    pub fn new(journey: impl Into<String>, error: ModelError) -> Self {
        Self {
            journey: journey.into(),
            error,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &ModelError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
