//! Timetable build configuration.

use chrono::Duration;

use crate::grouping::GroupingOptions;

/// Configuration parameters for building a timetable.
#[derive(Debug, Clone)]
pub struct TimetableConfig {
    /// How far ahead to look for an operating date when none is given (days).
    pub max_search_days: i64,

    /// How many days from today to offer as alternative dates.
    pub alternative_days: i64,

    /// Shortest run of regular journeys worth collapsing.
    pub min_abbreviation_run: usize,

    /// Whether to collapse regular runs at all.
    pub abbreviate: bool,

    /// Whether a journey borrowing another journey's pattern also borrows
    /// its calendar.
    pub inherit_calendar: bool,
}

impl TimetableConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_search_days: i64,
        alternative_days: i64,
        min_abbreviation_run: usize,
        abbreviate: bool,
        inherit_calendar: bool,
    ) -> Self {
        Self {
            max_search_days,
            alternative_days,
            min_abbreviation_run,
            abbreviate,
            inherit_calendar,
        }
    }

    /// Returns the date search horizon as a Duration.
    pub fn max_search(&self) -> Duration {
        Duration::days(self.max_search_days)
    }

    /// Returns the alternative date window as a Duration.
    pub fn alternative_window(&self) -> Duration {
        Duration::days(self.alternative_days)
    }

    pub fn grouping_options(&self) -> GroupingOptions {
        GroupingOptions {
            abbreviate: self.abbreviate.then_some(self.min_abbreviation_run),
        }
    }
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            max_search_days: 100,
            alternative_days: 21, // 3 weeks
            min_abbreviation_run: 3,
            abbreviate: true,
            inherit_calendar: true,
        }
    }
}
