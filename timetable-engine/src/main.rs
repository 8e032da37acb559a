use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timetable_engine::calendar::BankHolidayTable;
use timetable_engine::domain::ScheduleTime;
use timetable_engine::grouping::{Abbreviation, Cell, Grouping, JourneyColumn, Row};
use timetable_engine::model::{Document, DocumentError};
use timetable_engine::timetable::{Timetable, TimetableBuilder, TimetableConfig, TimetableError};

/// Print the timetable of a bus service for one date.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Schedule document (JSON)
    document: PathBuf,

    /// Date to show (default: next operating date)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Date to search and offer alternatives from (default: the local date)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Bank holidays as {"YYYY-MM-DD": ["Category", ...]}
    #[arg(long)]
    bank_holidays: Option<PathBuf>,

    /// Print the timetable as JSON
    #[arg(long)]
    json: bool,

    /// Days to search for an operating date
    #[arg(long, env = "TIMETABLE_MAX_SEARCH_DAYS")]
    max_search_days: Option<u32>,

    /// Days of alternative dates to offer
    #[arg(long, env = "TIMETABLE_ALTERNATIVE_DAYS")]
    alternative_days: Option<u32>,

    /// Show every journey in its own column
    #[arg(long, env = "TIMETABLE_NO_ABBREVIATE")]
    no_abbreviate: bool,
}

impl Args {
    fn config(&self) -> TimetableConfig {
        let defaults = TimetableConfig::default();
        TimetableConfig {
            max_search_days: self
                .max_search_days
                .map_or(defaults.max_search_days, i64::from),
            alternative_days: self
                .alternative_days
                .map_or(defaults.alternative_days, i64::from),
            abbreviate: !self.no_abbreviate,
            ..defaults
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Timetable(#[from] TimetableError),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(error) = run(&args) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = args.config();

    let document = Document::from_json_file(&args.document)?;
    info!(
        path = %args.document.display(),
        stops = document.stops.len(),
        patterns = document.journey_patterns.len(),
        journeys = document.vehicle_journeys.len(),
        "loaded document"
    );

    let bank_holidays = match &args.bank_holidays {
        Some(path) => load_bank_holidays(path)?,
        None => BankHolidayTable::new(),
    };

    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let timetable =
        TimetableBuilder::new(&document, &bank_holidays, &config).build(args.date, today)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&timetable)?);
    } else {
        print!("{}", render(&timetable));
    }
    Ok(())
}

fn load_bank_holidays(path: &Path) -> Result<BankHolidayTable, CliError> {
    let file = std::fs::File::open(path).map_err(DocumentError::from)?;
    let table: BankHolidayTable =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(DocumentError::from)?;
    info!(path = %path.display(), dates = table.len(), "loaded bank holidays");
    Ok(table)
}

/// One column as printed: a journey, or a collapsed run of journeys.
enum Column<'a> {
    Journey(&'a JourneyColumn),
    Run(&'a Abbreviation),
}

fn columns(grouping: &Grouping) -> Vec<Column<'_>> {
    let runs: HashMap<usize, &Abbreviation> = grouping
        .abbreviations()
        .map(|a| (a.start_column, a))
        .collect();

    let mut columns = Vec::new();
    let mut i = 0;
    while i < grouping.journeys.len() {
        match runs.get(&i) {
            Some(run) => {
                columns.push(Column::Run(run));
                i += run.colspan.max(1);
            }
            None => {
                columns.push(Column::Journey(&grouping.journeys[i]));
                i += 1;
            }
        }
    }
    columns
}

fn arrival(cell: &Cell) -> Option<ScheduleTime> {
    match cell {
        Cell::Visit { arrival, .. } => Some(*arrival),
        _ => None,
    }
}

fn departure(cell: &Cell) -> Option<ScheduleTime> {
    match cell {
        Cell::Visit { departure, .. } => Some(*departure),
        _ => None,
    }
}

struct Layout<'a> {
    columns: Vec<Column<'a>>,
    widths: Vec<usize>,
    label_width: usize,
}

impl Layout<'_> {
    /// One printed line of `row`, the `index`-th row of the grouping. A run's
    /// text goes on its middle row, and only on departure lines.
    fn line(
        &self,
        label: &str,
        row: &Row,
        index: usize,
        time: fn(&Cell) -> Option<ScheduleTime>,
        runs: bool,
    ) -> String {
        let mut out = format!("{label:width$}", width = self.label_width);
        let mut cells = row.cells.iter();
        for (column, width) in self.columns.iter().zip(&self.widths) {
            let text = match column {
                Column::Journey(_) => cells
                    .next()
                    .and_then(time)
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                Column::Run(run) => {
                    // Only the first row carries the run's cell
                    if index == 0 {
                        cells.next();
                    }
                    if runs && index == run.rowspan / 2 {
                        run.to_string()
                    } else {
                        String::new()
                    }
                }
            };
            out.push_str(&format!("  {text:>width$}"));
        }
        out.push('\n');
        out
    }
}

fn render_grouping(grouping: &Grouping) -> String {
    let mut out = format!("{}\n", grouping.direction);
    if grouping.is_empty() {
        out.push_str("  no journeys\n");
        return out;
    }

    let columns = columns(grouping);
    let names: Vec<String> = grouping
        .rows
        .iter()
        .map(|r| {
            let indent = if r.is_minor() { "  " } else { "" };
            format!("{indent}{}", r.stop.display_name())
        })
        .collect();
    let name_width = names.iter().map(String::len).max().unwrap_or(0);
    let headings: Vec<String> = columns
        .iter()
        .map(|c| match c {
            Column::Journey(j) => j.private_code.clone().unwrap_or_else(|| j.code.clone()),
            Column::Run(_) => String::new(),
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .zip(&headings)
        .map(|(c, heading)| match c {
            Column::Journey(_) => heading.len().max(5),
            Column::Run(run) => run.to_string().len(),
        })
        .collect();
    let layout = Layout {
        columns,
        widths,
        label_width: name_width + 4,
    };

    out.push_str(&format!("{:width$}", "", width = layout.label_width));
    for (heading, width) in headings.iter().zip(&layout.widths) {
        out.push_str(&format!("  {heading:>width$}"));
    }
    out.push('\n');

    for (i, (row, name)) in grouping.rows.iter().zip(&names).enumerate() {
        if row.has_wait_time() {
            let arr = format!("{name:name_width$} arr");
            out.push_str(&layout.line(&arr, row, i, arrival, false));
            let dep = format!("{name:name_width$} dep");
            out.push_str(&layout.line(&dep, row, i, departure, true));
        } else {
            out.push_str(&layout.line(name, row, i, departure, true));
        }
    }

    if grouping.has_minor_stops() {
        out.push_str("  Indented stops are minor timing points with approximate times\n");
    }

    for (code, feet) in &grouping.column_feet {
        for foot in feet {
            if let Some(note) = &foot.note {
                let first = foot.start + 1;
                let last = foot.start + foot.span;
                out.push_str(&format!("  [{code}] journeys {first}-{last}: {note}\n"));
            }
        }
    }
    out
}

fn render(timetable: &Timetable) -> String {
    let mut out = format!("Timetable for {}\n\n", timetable.date.format("%A %-d %B %Y"));
    for grouping in &timetable.groupings {
        out.push_str(&render_grouping(grouping));
        out.push('\n');
    }

    for d in &timetable.diagnostics {
        out.push_str(&format!("excluded {}: {}\n", d.journey, d.error));
    }

    if !timetable.alternative_dates.is_empty() {
        let dates: Vec<String> = timetable
            .alternative_dates
            .iter()
            .map(|d| d.to_string())
            .collect();
        out.push_str(&format!("Other dates: {}\n", dates.join(", ")));
    }
    out
}
