//! Journey reference resolution.
//!
//! A vehicle journey names either a pattern or another vehicle journey.
//! Journeys are first indexed by code, then each one's reference chain is
//! chased to a pattern with cycle detection. Failures exclude only the
//! journey concerned.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::calendar::OperatingProfile;

use super::{Document, JourneyDiagnostic, JourneyPattern, JourneySource, ModelError, VehicleJourney};

/// A journey with its pattern and effective calendar found.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedJourney<'d> {
    pub journey: &'d VehicleJourney,
    pub pattern: &'d JourneyPattern,
    /// `None` means the journey runs on every day of the operating period.
    pub calendar: Option<&'d OperatingProfile>,
}

/// Outcome of resolving every journey in a document.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'d> {
    /// Resolved journeys, in document order.
    pub journeys: Vec<ResolvedJourney<'d>>,
    pub diagnostics: Vec<JourneyDiagnostic>,
}

/// Resolve every journey in `document`.
///
/// The effective calendar is the journey's own profile; failing that, when
/// `inherit_calendar` is set, the nearest profile along its reference
/// chain; then the pattern's; then the document default.
pub fn resolve_journeys(document: &Document, inherit_calendar: bool) -> Resolution<'_> {
    let mut patterns: HashMap<&str, &JourneyPattern> = HashMap::new();
    for pattern in &document.journey_patterns {
        patterns.entry(pattern.id.as_str()).or_insert(pattern);
    }
    let mut journeys: HashMap<&str, &VehicleJourney> = HashMap::new();
    for journey in &document.vehicle_journeys {
        journeys.entry(journey.code.as_str()).or_insert(journey);
    }
    let stops = document.stops_by_code();

    let mut resolution = Resolution::default();
    for journey in &document.vehicle_journeys {
        let resolved = resolve_one(journey, &patterns, &journeys, inherit_calendar).and_then(|r| {
            if r.pattern.links.is_empty() {
                return Err(ModelError::EmptyPattern(r.pattern.id.clone()));
            }
            if let Some(usage) = r.pattern.stop_usages().find(|u| !stops.contains_key(&u.stop)) {
                return Err(ModelError::UnknownStop(usage.stop.clone()));
            }
            Ok(r)
        });

        match resolved {
            Ok(mut r) => {
                if r.calendar.is_none() {
                    r.calendar = r
                        .pattern
                        .operating_profile
                        .as_ref()
                        .or(document.operating_profile.as_ref());
                }
                resolution.journeys.push(r);
            }
            Err(error) => {
                debug!(journey = %journey.code, %error, "journey failed to resolve");
                resolution
                    .diagnostics
                    .push(JourneyDiagnostic::new(journey.code.clone(), error));
            }
        }
    }

    resolution
}

/// Chase one journey's references to a pattern.
///
/// The returned calendar only reflects journey-level profiles; pattern and
/// document defaults are applied by the caller.
fn resolve_one<'d>(
    journey: &'d VehicleJourney,
    patterns: &HashMap<&str, &'d JourneyPattern>,
    journeys: &HashMap<&str, &'d VehicleJourney>,
    inherit_calendar: bool,
) -> Result<ResolvedJourney<'d>, ModelError> {
    let mut calendar = journey.operating_profile.as_ref();
    let mut chain = vec![journey.code.clone()];
    let mut visited: HashSet<&str> = HashSet::from([journey.code.as_str()]);
    let mut current = journey;

    loop {
        match &current.source {
            JourneySource::JourneyPattern(id) => {
                let pattern = patterns
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| ModelError::UnknownPattern(id.clone()))?;
                return Ok(ResolvedJourney {
                    journey,
                    pattern,
                    calendar,
                });
            }
            JourneySource::VehicleJourney(code) => {
                chain.push(code.clone());
                if !visited.insert(code.as_str()) {
                    return Err(ModelError::ReferenceCycle(chain));
                }
                current = journeys
                    .get(code.as_str())
                    .copied()
                    .ok_or_else(|| ModelError::UnknownJourney(code.clone()))?;
                if inherit_calendar && calendar.is_none() {
                    calendar = current.operating_profile.as_ref();
                }
            }
        }
    }
}
