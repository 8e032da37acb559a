//! Timetable groupings: one matrix of stops by journeys per direction.

mod abbreviate;
mod column_foot;
mod rows;

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::calendar::OperatingProfile;
use crate::domain::{ScheduleTime, Stop, StopCode};
use crate::expand::ExpandedJourney;
use crate::model::{Activity, Direction, JourneyPattern, TimingStatus};

pub use abbreviate::{Abbreviation, abbreviate};
pub use column_foot::{ColumnFoot, column_feet};
pub use rows::{MatrixRow, RowId, RowMatrix};

/// One cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    /// The journey doesn't call at this row's stop.
    Empty,
    Visit {
        arrival: ScheduleTime,
        departure: ScheduleTime,
        activity: Activity,
        timing_status: TimingStatus,
    },
    /// Stands in for a regular run of columns across every row.
    Abbreviation(Abbreviation),
}

impl Cell {
    /// True for a visit with no dwell.
    pub fn is_same_time(&self) -> bool {
        matches!(self, Cell::Visit { arrival, departure, .. } if arrival == departure)
    }
}

/// One stop row of a grouping.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Row {
    pub stop: Stop,
    /// 0 for the first visit to the stop, 1 for a second visit on a loop.
    pub occurrence: usize,
    pub timing_status: TimingStatus,
    /// Cells after abbreviation, so possibly fewer than there are journeys.
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn is_minor(&self) -> bool {
        self.timing_status == TimingStatus::Other
    }

    /// True if any journey dwells at this stop.
    pub fn has_wait_time(&self) -> bool {
        self.cells
            .iter()
            .any(|c| matches!(c, Cell::Visit { .. }) && !c.is_same_time())
    }
}

/// Column heading information for one journey.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct JourneyColumn {
    pub code: String,
    pub private_code: Option<String>,
    pub line: Option<String>,
    pub pattern_id: String,
    /// Departure from the first visible stop.
    pub departure: ScheduleTime,
    pub notes: BTreeMap<String, String>,
    #[serde(skip)]
    pub calendar: Option<OperatingProfile>,
}

/// Stops by journeys for one direction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Grouping {
    pub direction: Direction,
    pub rows: Vec<Row>,
    /// Columns in display order.
    pub journeys: Vec<JourneyColumn>,
    pub column_feet: BTreeMap<String, Vec<ColumnFoot>>,
}

/// How a grouping should be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Minimum run length to abbreviate, or `None` to keep every column.
    pub abbreviate: Option<usize>,
}

impl Grouping {
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            rows: Vec::new(),
            journeys: Vec::new(),
            column_feet: BTreeMap::new(),
        }
    }

    /// Lay out `journeys`, given in document order.
    ///
    /// Journeys with no visible stops are left out. Row order depends on the
    /// order the patterns are first met in `journeys`.
    pub fn build(
        direction: Direction,
        journeys: Vec<ExpandedJourney<'_>>,
        stops: &HashMap<&StopCode, &Stop>,
        options: GroupingOptions,
    ) -> Self {
        let mut journeys: Vec<ExpandedJourney<'_>> = journeys
            .into_iter()
            .filter(|j| {
                let visible = !j.times.is_empty();
                if !visible {
                    debug!(journey = %j.resolved.journey.code, "no visible stops");
                }
                visible
            })
            .collect();
        if journeys.is_empty() {
            return Self::empty(direction);
        }

        let mut patterns: Vec<&JourneyPattern> = Vec::new();
        let mut pattern_index: HashMap<&str, usize> = HashMap::new();
        for j in &journeys {
            let pattern = j.resolved.pattern;
            pattern_index.entry(pattern.id.as_str()).or_insert_with(|| {
                patterns.push(pattern);
                patterns.len() - 1
            });
        }
        let matrix = RowMatrix::build(&patterns);

        // Stable, so equal departures keep document order
        journeys.sort_by_key(|j| j.first_departure());

        let mut grid: Vec<Vec<Option<Cell>>> =
            vec![vec![Some(Cell::Empty); journeys.len()]; matrix.len()];
        for (column, journey) in journeys.iter().enumerate() {
            let pattern = pattern_index[journey.resolved.pattern.id.as_str()];
            for t in &journey.times {
                if let Some(row) = matrix.row_index(pattern, t.position) {
                    grid[row][column] = Some(Cell::Visit {
                        arrival: t.arrival,
                        departure: t.departure,
                        activity: t.stop_usage.activity,
                        timing_status: t.stop_usage.timing_status,
                    });
                }
            }
        }

        let columns: Vec<JourneyColumn> = journeys.iter().map(column).collect();

        if let Some(min_run) = options.abbreviate {
            let runs = abbreviate(&mut grid, &columns, min_run);
            debug!(%direction, runs, "abbreviated");
        }

        let rows = matrix
            .rows()
            .zip(grid)
            .map(|(row, cells)| Row {
                stop: stops
                    .get(&row.stop)
                    .map(|s| (*s).clone())
                    .unwrap_or_else(|| Stop::new(row.stop.clone(), row.stop.as_str())),
                occurrence: row.occurrence,
                timing_status: row.timing_status,
                cells: cells.into_iter().flatten().collect(),
            })
            .collect();

        debug!(
            %direction,
            rows = matrix.len(),
            journeys = columns.len(),
            patterns = patterns.len(),
            "built grouping"
        );

        Self {
            direction,
            rows,
            column_feet: column_feet(&columns),
            journeys: columns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    /// Abbreviated runs, read from the first row.
    pub fn abbreviations(&self) -> impl Iterator<Item = &Abbreviation> {
        self.rows.first().into_iter().flat_map(|row| {
            row.cells.iter().filter_map(|c| match c {
                Cell::Abbreviation(a) => Some(a),
                _ => None,
            })
        })
    }

    /// True if any row carries the minor timing status.
    pub fn has_minor_stops(&self) -> bool {
        self.rows.iter().any(Row::is_minor)
    }
}

fn column(journey: &ExpandedJourney<'_>) -> JourneyColumn {
    let vj = journey.resolved.journey;
    JourneyColumn {
        code: vj.code.clone(),
        private_code: vj.private_code.clone(),
        line: vj.line.clone(),
        pattern_id: journey.resolved.pattern.id.clone(),
        departure: journey.first_departure().unwrap_or(vj.departure_time),
        notes: vj.notes.clone(),
        calendar: journey.resolved.calendar.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_journey;
    use crate::model::{JourneyPattern, ResolvedJourney, StopUsage, TimingLink, VehicleJourney};
    use chrono::Duration;

    fn time(s: &str) -> ScheduleTime {
        ScheduleTime::parse(s).unwrap()
    }

    fn code(s: &str) -> StopCode {
        StopCode::parse(s).unwrap()
    }

    fn pattern(id: &str, codes: &[&str]) -> JourneyPattern {
        let links = codes
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                TimingLink::new(
                    format!("{id}-{i}"),
                    StopUsage::new(code(w[0])),
                    StopUsage::new(code(w[1])),
                    Duration::minutes(10),
                )
            })
            .collect();
        JourneyPattern::new(id, Direction::Outbound, links)
    }

    fn expanded<'d>(vj: &'d VehicleJourney, p: &'d JourneyPattern) -> ExpandedJourney<'d> {
        expand_journey(ResolvedJourney {
            journey: vj,
            pattern: p,
            calendar: None,
        })
        .unwrap()
    }

    fn departures(row: &Row) -> Vec<String> {
        row.cells
            .iter()
            .map(|c| match c {
                Cell::Empty => "-".to_string(),
                Cell::Visit { departure, .. } => departure.to_string(),
                Cell::Abbreviation(a) => a.to_string(),
            })
            .collect()
    }

    const OPTIONS: GroupingOptions = GroupingOptions { abbreviate: Some(3) };

    #[test]
    fn columns_sorted_and_rows_merged() {
        let short = pattern("JP1", &["A", "B", "C"]);
        let long = pattern("JP2", &["A", "X", "B", "C"]);
        let vj1 = VehicleJourney::on_pattern("VJ1", time("10:00"), "JP1");
        let vj2 = VehicleJourney::on_pattern("VJ2", time("09:00"), "JP2");
        let stops = vec![
            Stop::new(code("A"), "Alpha"),
            Stop::new(code("B"), "Beta"),
            Stop::new(code("C"), "Gamma"),
        ];
        let by_code: HashMap<&StopCode, &Stop> = stops.iter().map(|s| (&s.code, s)).collect();

        let g = Grouping::build(
            Direction::Outbound,
            vec![expanded(&vj1, &short), expanded(&vj2, &long)],
            &by_code,
            OPTIONS,
        );

        let codes: Vec<&str> = g.journeys.iter().map(|j| j.code.as_str()).collect();
        assert_eq!(codes, vec!["VJ2", "VJ1"]);
        let names: Vec<&str> = g.rows.iter().map(|r| r.stop.common_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "X", "Beta", "Gamma"]);
        assert_eq!(departures(&g.rows[0]), vec!["09:00", "10:00"]);
        assert_eq!(departures(&g.rows[1]), vec!["09:10", "-"]);
        assert_eq!(departures(&g.rows[2]), vec!["09:20", "10:10"]);
    }

    #[test]
    fn abbreviated_rows_lose_collapsed_cells() {
        let p = pattern("JP1", &["A", "B"]);
        let vjs: Vec<VehicleJourney> = ["07:00", "07:30", "08:00", "08:30", "09:10"]
            .iter()
            .enumerate()
            .map(|(i, t)| VehicleJourney::on_pattern(format!("VJ{i}"), time(t), "JP1"))
            .collect();
        let journeys = vjs.iter().map(|vj| expanded(vj, &p)).collect();
        let g = Grouping::build(Direction::Outbound, journeys, &HashMap::new(), OPTIONS);

        assert_eq!(g.journeys.len(), 5);
        assert_eq!(departures(&g.rows[0]), vec!["every 30 minutes until", "09:10"]);
        assert_eq!(departures(&g.rows[1]), vec!["09:20"]);
        let a: Vec<&Abbreviation> = g.abbreviations().collect();
        assert_eq!(a.len(), 1);
        assert_eq!((a[0].colspan, a[0].rowspan), (4, 2));
    }

    #[test]
    fn abbreviation_can_be_turned_off() {
        let p = pattern("JP1", &["A", "B"]);
        let vjs: Vec<VehicleJourney> = ["07:00", "07:30", "08:00"]
            .iter()
            .enumerate()
            .map(|(i, t)| VehicleJourney::on_pattern(format!("VJ{i}"), time(t), "JP1"))
            .collect();
        let journeys = vjs.iter().map(|vj| expanded(vj, &p)).collect();
        let g = Grouping::build(
            Direction::Outbound,
            journeys,
            &HashMap::new(),
            GroupingOptions { abbreviate: None },
        );
        assert_eq!(g.rows[0].cells.len(), 3);
        assert_eq!(g.abbreviations().count(), 0);
    }

    #[test]
    fn invisible_journeys_are_dropped() {
        let p = pattern("JP1", &["A", "B"]);
        let mut vj = VehicleJourney::on_pattern("VJ1", time("07:00"), "JP1");
        vj.start_dead_run = Some("JP1-0".into());
        vj.end_dead_run = Some("JP1-0".into());
        let journeys = vec![expanded(&vj, &p)];
        let g = Grouping::build(Direction::Inbound, journeys, &HashMap::new(), OPTIONS);
        assert!(g.is_empty());
        assert!(g.rows.is_empty());
    }

    #[test]
    fn notes_become_column_feet() {
        let p = pattern("JP1", &["A", "B"]);
        let vj1 =
            VehicleJourney::on_pattern("VJ1", time("07:00"), "JP1").with_note("SD", "Schooldays");
        let vj2 = VehicleJourney::on_pattern("VJ2", time("08:00"), "JP1");
        let g = Grouping::build(
            Direction::Outbound,
            vec![expanded(&vj1, &p), expanded(&vj2, &p)],
            &HashMap::new(),
            OPTIONS,
        );
        assert_eq!(g.column_feet["SD"].len(), 2);
        assert_eq!(g.column_feet["SD"][0].note.as_deref(), Some("Schooldays"));
    }

    #[test]
    fn dwell_shows_in_row() {
        let mut p = pattern("JP1", &["A", "B", "C"]);
        p.links[1].from.wait_time = Some(Duration::minutes(2));
        let vj = VehicleJourney::on_pattern("VJ1", time("07:00"), "JP1");
        let journeys = vec![expanded(&vj, &p)];
        let g = Grouping::build(Direction::Outbound, journeys, &HashMap::new(), OPTIONS);
        assert!(!g.rows[0].has_wait_time());
        assert!(g.rows[1].has_wait_time());
    }

    #[test]
    fn cells_serialize_with_type_tag() {
        let json = serde_json::to_value(Cell::Empty).unwrap();
        assert_eq!(json["type"], "empty");
        let visit = Cell::Visit {
            arrival: time("09:00"),
            departure: time("09:02"),
            activity: Activity::SetDown,
            timing_status: TimingStatus::Other,
        };
        let json = serde_json::to_value(visit).unwrap();
        assert_eq!(json["type"], "visit");
        assert_eq!(json["activity"], "set_down");
        assert!(!visit.is_same_time());
    }
}
