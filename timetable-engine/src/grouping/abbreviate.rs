//! Collapsing regular runs of journeys into one "every N minutes" cell.

use std::fmt;

use chrono::Duration;
use tracing::trace;

use crate::domain::seconds;

use super::{Cell, JourneyColumn};

/// A run of regularly spaced journeys shown as a single spanning cell.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use timetable_engine::grouping::Abbreviation;
///
/// let a = Abbreviation {
///     start_column: 2,
///     colspan: 4,
///     rowspan: 10,
///     headway: Duration::minutes(15),
/// };
/// assert_eq!(a.to_string(), "every 15 minutes until");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Abbreviation {
    /// Column of the first journey in the run.
    pub start_column: usize,
    /// Number of journeys collapsed.
    pub colspan: usize,
    /// Number of rows covered, which is every row of the grouping.
    pub rowspan: usize,
    #[serde(serialize_with = "seconds::serialize")]
    pub headway: Duration,
}

impl Abbreviation {
    /// "hourly", "every N hours" or "every N minutes".
    pub fn headway_text(&self) -> String {
        let minutes = self.headway.num_minutes();
        if minutes == 60 {
            "hourly".to_string()
        } else if minutes % 60 == 0 {
            format!("every {} hours", minutes / 60)
        } else {
            format!("every {minutes} minutes")
        }
    }

    /// Columns covered by the run.
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start_column..self.start_column + self.colspan
    }
}

impl fmt::Display for Abbreviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} until", self.headway_text())
    }
}

/// Minutes that make a headway regular: divisors and multiples of an hour.
fn is_clockface(headway: Duration) -> bool {
    if headway <= Duration::zero() || headway.num_seconds() % 60 != 0 {
        return false;
    }
    let minutes = headway.num_minutes();
    60 % minutes == 0 || minutes % 60 == 0
}

/// Headway between columns `a` and `b` if they are interchangeable apart
/// from a uniform time shift.
fn regular_delta(
    grid: &[Vec<Option<Cell>>],
    columns: &[JourneyColumn],
    a: usize,
    b: usize,
) -> Option<Duration> {
    let (first, second) = (&columns[a], &columns[b]);
    if first.pattern_id != second.pattern_id
        || first.notes != second.notes
        || first.calendar != second.calendar
    {
        return None;
    }

    let delta = second.departure.signed_duration_since(first.departure);
    if !is_clockface(delta) {
        return None;
    }

    // Timing status is not compared
    let shifted = grid.iter().all(|row| match (&row[a], &row[b]) {
        (Some(Cell::Empty), Some(Cell::Empty)) => true,
        (
            Some(Cell::Visit {
                arrival: arr_a,
                departure: dep_a,
                activity: act_a,
                ..
            }),
            Some(Cell::Visit {
                arrival: arr_b,
                departure: dep_b,
                activity: act_b,
                ..
            }),
        ) => {
            act_a == act_b
                && arr_b.signed_duration_since(*arr_a) == delta
                && dep_b.signed_duration_since(*dep_a) == delta
        }
        _ => false,
    });
    shifted.then_some(delta)
}

/// Collapse regular runs of at least `min_run` columns in place.
///
/// Collapsed cells are set to `None` except the first cell of row 0, which
/// becomes the [`Cell::Abbreviation`]. Returns the number of runs collapsed.
pub fn abbreviate(
    grid: &mut [Vec<Option<Cell>>],
    columns: &[JourneyColumn],
    min_run: usize,
) -> usize {
    if grid.is_empty() || columns.len() < 2 {
        return 0;
    }
    let min_run = min_run.max(2);
    let mut collapsed = 0;

    let mut start = 0;
    let mut headway = None;
    for i in 1..columns.len() {
        let delta = regular_delta(grid, columns, i - 1, i);
        if headway.is_some() && delta == headway {
            continue;
        }
        let closed = close_run(grid, start..i, headway, min_run);
        if closed {
            collapsed += 1;
        }
        if closed || delta.is_none() {
            start = i;
            headway = None;
        } else {
            // The previous column may begin a new run with a different headway
            start = i - 1;
            headway = delta;
        }
    }
    if close_run(grid, start..columns.len(), headway, min_run) {
        collapsed += 1;
    }

    collapsed
}

fn close_run(
    grid: &mut [Vec<Option<Cell>>],
    run: std::ops::Range<usize>,
    headway: Option<Duration>,
    min_run: usize,
) -> bool {
    let Some(headway) = headway else {
        return false;
    };
    let colspan = run.len();
    if colspan < min_run {
        return false;
    }

    let start = run.start;
    let rowspan = grid.len();
    for row in grid.iter_mut() {
        for cell in &mut row[run.clone()] {
            *cell = None;
        }
    }
    grid[0][start] = Some(Cell::Abbreviation(Abbreviation {
        start_column: start,
        colspan,
        rowspan,
        headway,
    }));
    trace!(start, colspan, headway = headway.num_minutes(), "collapsed run");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleTime;
    use crate::model::{Activity, TimingStatus};
    use std::collections::BTreeMap;

    fn time(s: &str) -> ScheduleTime {
        ScheduleTime::parse(s).unwrap()
    }

    fn visit(t: ScheduleTime) -> Option<Cell> {
        Some(Cell::Visit {
            arrival: t,
            departure: t,
            activity: Activity::PickUpAndSetDown,
            timing_status: TimingStatus::Principal,
        })
    }

    fn column(code: &str, departure: ScheduleTime) -> JourneyColumn {
        JourneyColumn {
            code: code.into(),
            private_code: None,
            line: None,
            pattern_id: "JP1".into(),
            departure,
            notes: BTreeMap::new(),
            calendar: None,
        }
    }

    /// Journeys on a three-stop pattern taking 5 then 7 minutes.
    fn grid(departures: &[&str]) -> (Vec<Vec<Option<Cell>>>, Vec<JourneyColumn>) {
        let columns: Vec<JourneyColumn> = departures
            .iter()
            .enumerate()
            .map(|(i, d)| column(&format!("VJ{i}"), time(d)))
            .collect();
        let offsets = [0, 5, 12];
        let grid = offsets
            .iter()
            .map(|m| {
                columns
                    .iter()
                    .map(|c| visit(c.departure + Duration::minutes(*m)))
                    .collect()
            })
            .collect();
        (grid, columns)
    }

    fn abbreviations(grid: &[Vec<Option<Cell>>]) -> Vec<Abbreviation> {
        grid[0]
            .iter()
            .filter_map(|c| match c {
                Some(Cell::Abbreviation(a)) => Some(*a),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn twenty_minute_run_collapses() {
        let (mut g, columns) = grid(&["09:00", "09:20", "09:40", "10:30"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 1);

        let found = abbreviations(&g);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_column, 0);
        assert_eq!(found[0].colspan, 3);
        assert_eq!(found[0].rowspan, 3);
        assert_eq!(found[0].headway_text(), "every 20 minutes");

        // 10:30 is left as an ordinary column
        for row in &g {
            assert!(matches!(row[3], Some(Cell::Visit { .. })));
            assert!(row[1].is_none() && row[2].is_none());
        }
        assert!(g[1][0].is_none());
    }

    #[test]
    fn two_columns_are_not_enough() {
        let (mut g, columns) = grid(&["09:00", "09:20"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
        assert!(abbreviations(&g).is_empty());
    }

    #[test]
    fn irregular_headway_is_left_alone() {
        let (mut g, columns) = grid(&["09:00", "09:07", "09:14", "09:21"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
    }

    #[test]
    fn hourly_and_multi_hour() {
        let (mut g, columns) = grid(&["08:00", "09:00", "10:00", "12:00", "14:00", "16:00"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 2);

        let found = abbreviations(&g);
        assert_eq!(found[0].columns(), 0..3);
        assert_eq!(found[0].headway_text(), "hourly");
        assert_eq!(found[1].columns(), 3..6);
        assert_eq!(found[1].to_string(), "every 2 hours until");
    }

    #[test]
    fn run_ends_where_headway_changes() {
        // 10:00 could belong to either run; the earlier run keeps it
        let (mut g, columns) = grid(&["09:00", "09:30", "10:00", "10:15", "10:30"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 1);
        let found = abbreviations(&g);
        assert_eq!(found[0].columns(), 0..3);
    }

    #[test]
    fn short_run_hands_over_to_next() {
        let (mut g, columns) = grid(&["09:00", "09:30", "09:45", "10:00", "10:15"]);
        assert_eq!(abbreviate(&mut g, &columns, 3), 1);
        assert_eq!(abbreviations(&g)[0].columns(), 1..5);
        assert!(matches!(g[0][0], Some(Cell::Visit { .. })));
    }

    #[test]
    fn notes_break_a_run() {
        let (mut g, mut columns) = grid(&["09:00", "09:20", "09:40", "10:00"]);
        columns[2].notes.insert("SD".into(), "Schooldays only".into());
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
    }

    #[test]
    fn different_pattern_breaks_a_run() {
        let (mut g, mut columns) = grid(&["09:00", "09:20", "09:40"]);
        columns[1].pattern_id = "JP2".into();
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
    }

    #[test]
    fn uneven_running_time_breaks_a_run() {
        let (mut g, columns) = grid(&["09:00", "09:20", "09:40"]);
        g[2][1] = visit(time("09:33"));
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
    }

    #[test]
    fn empty_cell_must_stay_empty() {
        let (mut g, columns) = grid(&["09:00", "09:20", "09:40"]);
        g[1][2] = Some(Cell::Empty);
        assert_eq!(abbreviate(&mut g, &columns, 3), 0);
    }

    #[test]
    fn timing_status_change_does_not_break_a_run() {
        let (mut g, columns) = grid(&["09:00", "09:20", "09:40"]);
        if let Some(Cell::Visit { timing_status, .. }) = &mut g[2][1] {
            *timing_status = TimingStatus::Other;
        }
        assert_eq!(abbreviate(&mut g, &columns, 3), 1);
        assert_eq!(abbreviations(&g)[0].colspan, 3);
    }

    #[test]
    fn larger_minimum_run() {
        let (mut g, columns) = grid(&["09:00", "09:20", "09:40"]);
        assert_eq!(abbreviate(&mut g, &columns, 4), 0);
    }

    #[test]
    fn expanding_the_cell_gives_back_the_departures() {
        let (mut g, columns) = grid(&["06:45", "07:00", "07:15", "07:30", "07:45", "08:05"]);
        let before: Vec<ScheduleTime> = columns.iter().map(|c| c.departure).collect();
        abbreviate(&mut g, &columns, 3);

        let a = abbreviations(&g)[0];
        let first = before[a.start_column];
        let expanded: Vec<ScheduleTime> = (0..a.colspan)
            .map(|k| first + a.headway * k as i32)
            .collect();
        assert_eq!(expanded, before[a.columns()]);
    }
}
