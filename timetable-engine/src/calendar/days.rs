//! Weekly day-of-week sets.

use chrono::Weekday;
use std::fmt;

/// Error returned when a day-of-week expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid days of week {token:?}: {reason}")]
pub struct InvalidDays {
    token: String,
    reason: &'static str,
}

/// A set of weekdays, stored as one bit per day.
///
/// # Examples
///
/// ```
/// use timetable_engine::calendar::DaysOfWeek;
/// use chrono::Weekday;
///
/// let days = DaysOfWeek::parse("MondayToFriday").unwrap();
/// assert!(days.contains(Weekday::Wed));
/// assert!(!days.contains(Weekday::Sat));
///
/// let days = DaysOfWeek::parse("Weekend").unwrap();
/// assert_eq!(days.len(), 2);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DaysOfWeek {
    flags: u8,
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl DaysOfWeek {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every day of the week.
    pub fn all() -> Self {
        Self { flags: 0b111_1111 }
    }

    pub fn with(mut self, weekday: Weekday) -> Self {
        self.insert(weekday);
        self
    }

    pub fn insert(&mut self, weekday: Weekday) {
        self.flags |= 1 << weekday.num_days_from_monday();
    }

    pub fn remove(&mut self, weekday: Weekday) {
        self.flags &= !(1 << weekday.num_days_from_monday());
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.flags & (1 << weekday.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.flags == 0
    }

    pub fn len(&self) -> usize {
        self.flags.count_ones() as usize
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            flags: self.flags | other.flags,
        }
    }

    /// Iterate the days in the set, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_DAYS.into_iter().filter(move |d| self.contains(*d))
    }

    /// Parse a day-of-week expression.
    ///
    /// Accepts comma or whitespace separated tokens, each one of: a day name
    /// (`Monday`), a range (`MondayToFriday`, wrapping ranges such as
    /// `FridayToMonday` are allowed), `Weekend` or `NotSaturday`.
    pub fn parse(s: &str) -> Result<Self, InvalidDays> {
        let mut days = Self::new();
        for token in s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            days = days.union(parse_token(token)?);
        }
        Ok(days)
    }
}

fn parse_token(token: &str) -> Result<DaysOfWeek, InvalidDays> {
    let invalid = |reason| InvalidDays {
        token: token.to_string(),
        reason,
    };

    match token {
        "Weekend" => return Ok(DaysOfWeek::new().with(Weekday::Sat).with(Weekday::Sun)),
        "NotSaturday" => {
            let mut days = DaysOfWeek::all();
            days.remove(Weekday::Sat);
            return Ok(days);
        }
        _ => {}
    }

    if let Some((from, to)) = token.split_once("To") {
        let from = parse_day(from).ok_or_else(|| invalid("unknown start day"))?;
        let to = parse_day(to).ok_or_else(|| invalid("unknown end day"))?;
        let mut days = DaysOfWeek::new();
        let mut day = from;
        loop {
            days.insert(day);
            if day == to {
                break;
            }
            day = day.succ();
        }
        return Ok(days);
    }

    parse_day(token)
        .map(|d| DaysOfWeek::new().with(d))
        .ok_or_else(|| invalid("unknown day"))
}

fn parse_day(name: &str) -> Option<Weekday> {
    Some(match name {
        "Monday" => Weekday::Mon,
        "Tuesday" => Weekday::Tue,
        "Wednesday" => Weekday::Wed,
        "Thursday" => Weekday::Thu,
        "Friday" => Weekday::Fri,
        "Saturday" => Weekday::Sat,
        "Sunday" => Weekday::Sun,
        _ => return None,
    })
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl fmt::Debug for DaysOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for DaysOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(day_name).collect();
        f.write_str(&names.join(","))
    }
}

impl TryFrom<String> for DaysOfWeek {
    type Error = InvalidDays;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DaysOfWeek> for String {
    fn from(value: DaysOfWeek) -> Self {
        value.to_string()
    }
}
