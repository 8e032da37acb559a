//! Timetable assembly.
//!
//! Picks the date to show, filters journeys by calendar, expands the ones
//! that run and lays them out as one grouping per direction. Nothing is
//! cached between builds; the same document can be built for many dates.

mod config;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::calendar::{BankHolidayTable, DaysOfWeek};
use crate::expand::expand_journey;
use crate::grouping::Grouping;
use crate::model::{
    Direction, Document, DocumentError, JourneyDiagnostic, ResolvedJourney, resolve_journeys,
};

pub use config::TimetableConfig;

/// Errors building a timetable.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// No date in the search window has a journey running
    #[error("service does not operate in the {days} days from {from}")]
    DoesNotOperate { from: NaiveDate, days: i64 },

    /// The document couldn't be loaded
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A service's journeys on one date, laid out for display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Timetable {
    pub date: NaiveDate,
    /// Outbound first; inbound only when it has journeys.
    pub groupings: Vec<Grouping>,
    /// Nearby dates worth offering, in order.
    pub alternative_dates: Vec<NaiveDate>,
    /// Journeys left out because they couldn't be resolved or expanded.
    pub diagnostics: Vec<JourneyDiagnostic>,
}

impl Timetable {
    pub fn grouping(&self, direction: Direction) -> Option<&Grouping> {
        self.groupings.iter().find(|g| g.direction == direction)
    }

    /// True when no grouping has any journeys.
    pub fn is_empty(&self) -> bool {
        self.groupings.iter().all(Grouping::is_empty)
    }
}

/// Builds [`Timetable`]s from one document.
#[derive(Debug, Clone, Copy)]
pub struct TimetableBuilder<'a> {
    document: &'a Document,
    bank_holidays: &'a BankHolidayTable,
    config: &'a TimetableConfig,
}

impl<'a> TimetableBuilder<'a> {
    pub fn new(
        document: &'a Document,
        bank_holidays: &'a BankHolidayTable,
        config: &'a TimetableConfig,
    ) -> Self {
        Self {
            document,
            bank_holidays,
            config,
        }
    }

    /// Build the timetable for `date`, or for the next operating date from
    /// `today` when no date is given.
    ///
    /// `today` also anchors the alternative dates.
    pub fn build(
        &self,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Timetable, TimetableError> {
        let resolution = resolve_journeys(self.document, self.config.inherit_calendar);
        let mut diagnostics = resolution.diagnostics;
        for d in &diagnostics {
            warn!(journey = %d.journey, error = %d.error, "excluding journey");
        }

        let date = match date {
            Some(date) => date,
            None => self.default_date(&resolution.journeys, today)?,
        };

        let mut outbound = Vec::new();
        let mut inbound = Vec::new();
        for resolved in &resolution.journeys {
            if !self.runs_on(resolved, date) {
                continue;
            }
            match expand_journey(*resolved) {
                Ok(expanded) => match resolved.pattern.direction {
                    Direction::Outbound => outbound.push(expanded),
                    Direction::Inbound => inbound.push(expanded),
                },
                Err(error) => {
                    warn!(journey = %resolved.journey.code, %error, "excluding journey");
                    diagnostics.push(JourneyDiagnostic::new(resolved.journey.code.clone(), error));
                }
            }
        }

        let stops = self.document.stops_by_code();
        let options = self.config.grouping_options();
        let mut groupings = vec![Grouping::build(Direction::Outbound, outbound, &stops, options)];
        if !inbound.is_empty() {
            let grouping = Grouping::build(Direction::Inbound, inbound, &stops, options);
            if !grouping.is_empty() {
                groupings.push(grouping);
            }
        }

        let alternative_dates = self.alternative_dates(&resolution.journeys, date, today);

        debug!(
            %date,
            groupings = groupings.len(),
            diagnostics = diagnostics.len(),
            "built timetable"
        );

        Ok(Timetable {
            date,
            groupings,
            alternative_dates,
            diagnostics,
        })
    }

    fn in_period(&self, date: NaiveDate) -> bool {
        self.document
            .operating_period
            .is_none_or(|period| period.contains(date))
    }

    /// Whether `journey` runs on `date`. A journey without a calendar runs
    /// on every day of the operating period.
    pub fn runs_on(&self, journey: &ResolvedJourney<'_>, date: NaiveDate) -> bool {
        self.in_period(date)
            && journey
                .calendar
                .is_none_or(|calendar| calendar.should_show(date, self.bank_holidays))
    }

    /// First date with a journey running, searching forward from today or
    /// from the start of an operating period that hasn't begun yet.
    fn default_date(
        &self,
        journeys: &[ResolvedJourney<'_>],
        today: NaiveDate,
    ) -> Result<NaiveDate, TimetableError> {
        let from = match self.document.operating_period {
            Some(period) if today < period.start => period.start,
            _ => today,
        };

        let until = from
            .checked_add_signed(self.config.max_search())
            .unwrap_or(NaiveDate::MAX);
        let found = from
            .iter_days()
            .take_while(|date| *date < until)
            .find(|date| journeys.iter().any(|j| self.runs_on(j, *date)));

        match found {
            Some(date) => {
                debug!(%from, %date, "found operating date");
                Ok(date)
            }
            None => Err(TimetableError::DoesNotOperate {
                from,
                days: self.config.max_search_days,
            }),
        }
    }

    /// Dates in the window from `today` whose weekday some journey runs on,
    /// plus `date` itself.
    fn alternative_dates(
        &self,
        journeys: &[ResolvedJourney<'_>],
        date: NaiveDate,
        today: NaiveDate,
    ) -> Vec<NaiveDate> {
        let weekdays = journeys
            .iter()
            .fold(DaysOfWeek::new(), |days, j| match j.calendar {
                Some(calendar) => days.union(calendar.regular_days),
                None => DaysOfWeek::all(),
            });

        let until = today
            .checked_add_signed(self.config.alternative_window())
            .unwrap_or(NaiveDate::MAX);
        let mut dates: Vec<NaiveDate> = today
            .iter_days()
            .take_while(|d| *d < until)
            .filter(|d| self.in_period(*d) && weekdays.contains(d.weekday()))
            .collect();
        if !dates.contains(&date) {
            dates.push(date);
            dates.sort();
        }
        dates
    }
}
