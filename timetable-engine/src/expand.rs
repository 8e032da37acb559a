//! Journey time expansion.
//!
//! Walks a resolved journey's timing links from its departure time,
//! producing the arrival and departure at each visible stop for the day.

use std::collections::HashMap;

use chrono::Duration;
use tracing::trace;

use crate::domain::ScheduleTime;
use crate::model::{LinkOverride, ModelError, ResolvedJourney, StopUsage, TimingLink};

/// A journey's visit to one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedStop<'d> {
    /// Position of the stop usage within the pattern.
    pub position: usize,
    pub stop_usage: &'d StopUsage,
    pub arrival: ScheduleTime,
    pub departure: ScheduleTime,
}

/// A journey together with its expanded times.
#[derive(Debug, Clone)]
pub struct ExpandedJourney<'d> {
    pub resolved: ResolvedJourney<'d>,
    pub times: Vec<TimedStop<'d>>,
}

impl<'d> ExpandedJourney<'d> {
    /// Departure from the first visible stop.
    pub fn first_departure(&self) -> Option<ScheduleTime> {
        self.times.first().map(|t| t.departure)
    }
}

/// Iterator over a journey's visible stops.
///
/// The clock only runs forwards, so the iterator can't be restarted.
#[derive(Debug)]
pub struct JourneyTimes<'d> {
    links: std::slice::Iter<'d, TimingLink>,
    overrides: HashMap<&'d str, &'d LinkOverride>,
    start_dead_run: Option<&'d str>,
    end_dead_run: Option<&'d str>,
    clock: ScheduleTime,
    /// Dwell carried from the previous link's destination.
    carried_wait: Option<Duration>,
    in_dead_run: bool,
    service_ended: bool,
    position: usize,
    last: Option<&'d TimingLink>,
    finished: bool,
}

/// Start expanding `resolved`.
///
/// Fails before producing anything if the pattern is empty or a dead run
/// marker doesn't identify exactly one timing link.
pub fn expand<'d>(resolved: &ResolvedJourney<'d>) -> Result<JourneyTimes<'d>, ModelError> {
    let journey = resolved.journey;
    let pattern = resolved.pattern;

    if pattern.links.is_empty() {
        return Err(ModelError::EmptyPattern(pattern.id.clone()));
    }

    for marker in [&journey.start_dead_run, &journey.end_dead_run]
        .into_iter()
        .flatten()
    {
        let matches = pattern.links_with_id(marker).count();
        if matches != 1 {
            return Err(ModelError::DeadRunMarker {
                link: marker.clone(),
                matches,
            });
        }
    }

    let mut overrides = HashMap::with_capacity(journey.link_overrides.len());
    for o in &journey.link_overrides {
        if pattern.links_with_id(&o.link).next().is_none() {
            trace!(journey = %journey.code, link = %o.link, "override for unknown timing link");
        }
        overrides.insert(o.link.as_str(), o);
    }

    Ok(JourneyTimes {
        links: pattern.links.iter(),
        overrides,
        start_dead_run: journey.start_dead_run.as_deref(),
        end_dead_run: journey.end_dead_run.as_deref(),
        clock: journey.departure_time,
        carried_wait: None,
        in_dead_run: journey.start_dead_run.is_some(),
        service_ended: false,
        position: 0,
        last: None,
        finished: false,
    })
}

/// Expand a journey and collect its visible stops.
pub fn expand_journey<'d>(
    resolved: ResolvedJourney<'d>,
) -> Result<ExpandedJourney<'d>, ModelError> {
    let times = expand(&resolved)?.collect();
    Ok(ExpandedJourney { resolved, times })
}

fn add_waits(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

impl<'d> Iterator for JourneyTimes<'d> {
    type Item = TimedStop<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(link) = self.links.next() {
            let position = self.position;
            self.position += 1;
            self.last = Some(link);

            let link_override = self.overrides.get(link.id.as_str()).copied();
            let origin_wait = link_override
                .and_then(|o| o.from_wait_time)
                .or(link.from.wait_time);
            let dwell = add_waits(self.carried_wait.take(), origin_wait);

            let arrival = self.clock;
            let departure = arrival + dwell.unwrap_or_else(Duration::zero);
            let visible = !self.in_dead_run;

            let run_time = link_override
                .and_then(|o| o.run_time)
                .unwrap_or(link.run_time);
            self.clock = departure + run_time;
            self.carried_wait = link_override
                .and_then(|o| o.to_wait_time)
                .or(link.to.wait_time);

            // Passenger service stops after the end marker's origin and
            // starts at the start marker's destination
            if self.end_dead_run == Some(link.id.as_str()) {
                self.service_ended = true;
                self.in_dead_run = true;
            } else if self.in_dead_run
                && !self.service_ended
                && self.start_dead_run == Some(link.id.as_str())
            {
                self.in_dead_run = false;
            }

            if visible {
                return Some(TimedStop {
                    position,
                    stop_usage: &link.from,
                    arrival,
                    departure,
                });
            }
        }

        if self.finished {
            return None;
        }
        self.finished = true;

        let last = self.last?;
        if self.in_dead_run {
            return None;
        }
        Some(TimedStop {
            position: self.position,
            stop_usage: &last.to,
            arrival: self.clock,
            departure: self.clock,
        })
    }
}
