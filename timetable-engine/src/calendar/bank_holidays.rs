//! Bank holiday category table.
//!
//! Holiday dates are year-specific and supplied by the caller; the engine
//! only asks which categories a date belongs to.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

/// Category name meaning "every bank holiday".
pub const ALL_BANK_HOLIDAYS: &str = "AllBankHolidays";

/// Mapping from date to the bank holiday categories it falls in.
///
/// # Examples
///
/// ```
/// use timetable_engine::calendar::BankHolidayTable;
/// use chrono::NaiveDate;
///
/// let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
/// let table: BankHolidayTable = [(christmas, "ChristmasDay")].into_iter().collect();
///
/// assert!(table.is_bank_holiday(christmas));
/// assert!(table.categories(christmas).contains("ChristmasDay"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(transparent)]
pub struct BankHolidayTable {
    dates: HashMap<NaiveDate, BTreeSet<String>>,
}

impl BankHolidayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `date` belongs to `category`.
    pub fn insert(&mut self, date: NaiveDate, category: impl Into<String>) {
        self.dates.entry(date).or_default().insert(category.into());
    }

    pub fn is_bank_holiday(&self, date: NaiveDate) -> bool {
        self.dates.get(&date).is_some_and(|c| !c.is_empty())
    }

    /// Categories for `date`; empty when it is not a bank holiday.
    pub fn categories(&self, date: NaiveDate) -> BTreeSet<&str> {
        self.dates
            .get(&date)
            .map(|c| c.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of distinct holiday dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl<S: Into<String>> Extend<(NaiveDate, S)> for BankHolidayTable {
    fn extend<T: IntoIterator<Item = (NaiveDate, S)>>(&mut self, iter: T) {
        for (date, category) in iter {
            self.insert(date, category);
        }
    }
}

impl<S: Into<String>> FromIterator<(NaiveDate, S)> for BankHolidayTable {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, S)>>(iter: T) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
