//! Operating calendars.
//!
//! An [`OperatingProfile`] combines a weekly pattern with date-range
//! exceptions, bank holiday rules and serviced organisation (school term)
//! dates. [`OperatingProfile::should_show`] decides whether a journey using
//! the profile runs on one date.

mod bank_holidays;
mod days;

use chrono::{Datelike, NaiveDate};

pub use bank_holidays::{ALL_BANK_HOLIDAYS, BankHolidayTable};
pub use days::{DaysOfWeek, InvalidDays};

/// An inclusive date range; a missing end means the range never ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A range covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, Some(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.is_none_or(|end| date <= end)
    }
}

fn any_contains(ranges: &[DateRange], date: NaiveDate) -> bool {
    ranges.iter().any(|r| r.contains(date))
}

/// An institution, typically a school, whose term and holiday dates gate journeys.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServicedOrganisation {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Term time.
    #[serde(default)]
    pub working_days: Vec<DateRange>,
    #[serde(default)]
    pub holidays: Vec<DateRange>,
}

impl ServicedOrganisation {
    pub fn ranges(&self, days: OrganisationDays) -> &[DateRange] {
        match days {
            OrganisationDays::WorkingDays => &self.working_days,
            OrganisationDays::Holidays => &self.holidays,
        }
    }
}

/// Which half of a serviced organisation's year a rule refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrganisationDays {
    WorkingDays,
    Holidays,
}

/// Operation or non-operation on a serviced organisation's working days or holidays.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServicedOrganisationDayType {
    pub organisation: ServicedOrganisation,
    #[serde(default)]
    pub operation: Option<OrganisationDays>,
    #[serde(default)]
    pub non_operation: Option<OrganisationDays>,
}

impl ServicedOrganisationDayType {
    fn operation_ranges(&self) -> &[DateRange] {
        self.operation
            .map(|days| self.organisation.ranges(days))
            .unwrap_or_default()
    }

    fn non_operation_ranges(&self) -> &[DateRange] {
        self.non_operation
            .map(|days| self.organisation.ranges(days))
            .unwrap_or_default()
    }
}

/// The full set of rules determining the dates a journey runs.
///
/// # Examples
///
/// ```
/// use timetable_engine::calendar::{BankHolidayTable, DaysOfWeek, OperatingProfile};
/// use chrono::NaiveDate;
///
/// let profile = OperatingProfile::weekly(DaysOfWeek::parse("MondayToFriday").unwrap());
/// let holidays = BankHolidayTable::new();
///
/// let wednesday = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
/// let saturday = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
/// assert!(profile.should_show(wednesday, &holidays));
/// assert!(!profile.should_show(saturday, &holidays));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperatingProfile {
    #[serde(default)]
    pub regular_days: DaysOfWeek,
    #[serde(default)]
    pub special_non_operation: Vec<DateRange>,
    #[serde(default)]
    pub special_operation: Vec<DateRange>,
    /// Bank holiday categories on which the journey runs.
    #[serde(default)]
    pub bank_holiday_operation: Vec<String>,
    /// Bank holiday categories on which the journey does not run.
    #[serde(default)]
    pub bank_holiday_non_operation: Vec<String>,
    #[serde(default)]
    pub serviced_organisation: Option<ServicedOrganisationDayType>,
}

impl OperatingProfile {
    /// A profile with only a weekly pattern.
    pub fn weekly(regular_days: DaysOfWeek) -> Self {
        Self {
            regular_days,
            ..Self::default()
        }
    }

    /// Whether a journey with this profile runs on `date`.
    ///
    /// Rules are checked in order and the first that decides wins: weekday,
    /// bank holidays, an empty profile, serviced organisation dates, special
    /// non-operation ranges, then special operation ranges.
    pub fn should_show(&self, date: NaiveDate, bank_holidays: &BankHolidayTable) -> bool {
        if !self.regular_days.is_empty() && !self.regular_days.contains(date.weekday()) {
            return false;
        }

        if let Some(verdict) = self.bank_holiday_verdict(date, bank_holidays) {
            return verdict;
        }

        // Nothing positive specified
        if self.regular_days.is_empty() && self.special_operation.is_empty() {
            return false;
        }

        if let Some(day_type) = &self.serviced_organisation {
            if any_contains(day_type.non_operation_ranges(), date) {
                return false;
            }
            let operation = day_type.operation_ranges();
            if !operation.is_empty() {
                return any_contains(operation, date);
            }
        }

        if any_contains(&self.special_non_operation, date) {
            return false;
        }

        if !self.special_operation.is_empty() {
            return any_contains(&self.special_operation, date);
        }

        true
    }

    fn bank_holiday_verdict(
        &self,
        date: NaiveDate,
        bank_holidays: &BankHolidayTable,
    ) -> Option<bool> {
        if !bank_holidays.is_bank_holiday(date) {
            return None;
        }

        let is_all = |c: &String| c == ALL_BANK_HOLIDAYS;
        if self.bank_holiday_operation.iter().any(is_all) {
            return Some(true);
        }
        if self.bank_holiday_non_operation.iter().any(is_all) {
            return Some(false);
        }

        let categories = bank_holidays.categories(date);
        let matches = |c: &String| categories.contains(c.as_str());
        if self.bank_holiday_operation.iter().any(matches) {
            return Some(true);
        }
        if self.bank_holiday_non_operation.iter().any(matches) {
            return Some(false);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekdays() -> OperatingProfile {
        OperatingProfile::weekly(
            DaysOfWeek::parse("Monday,Tuesday,Wednesday,Thursday,Friday").unwrap(),
        )
    }

    fn school() -> ServicedOrganisation {
        ServicedOrganisation {
            code: "SCH1".into(),
            name: Some("Ashford School".into()),
            working_days: vec![DateRange::new(date(2025, 9, 1), Some(date(2025, 10, 24)))],
            holidays: vec![DateRange::new(date(2025, 10, 27), Some(date(2025, 10, 31)))],
        }
    }

    #[test]
    fn weekday_only_calendar() {
        let profile = weekdays();
        let none = BankHolidayTable::new();

        // Saturday
        assert!(!profile.should_show(date(2025, 6, 7), &none));
        // Wednesday
        assert!(profile.should_show(date(2025, 6, 4), &none));
    }

    #[test]
    fn bank_holiday_category_non_operation() {
        let mut profile = weekdays();
        profile.bank_holiday_non_operation = vec!["LateSummerBankHolidayNotScotland".into()];
        let table: BankHolidayTable = [(date(2025, 8, 25), "LateSummerBankHolidayNotScotland")]
            .into_iter()
            .collect();

        // Monday, matching weekday, but a non-operating bank holiday
        assert!(!profile.should_show(date(2025, 8, 25), &table));
        assert!(profile.should_show(date(2025, 8, 26), &table));
    }

    #[test]
    fn bank_holiday_unmentioned_category_falls_through() {
        let mut profile = weekdays();
        profile.bank_holiday_non_operation = vec!["ChristmasDay".into()];
        let table: BankHolidayTable = [(date(2025, 5, 5), "MayDay")].into_iter().collect();

        assert!(profile.should_show(date(2025, 5, 5), &table));
    }

    #[test]
    fn all_bank_holidays_wins_outright() {
        let mut profile = weekdays();
        profile.bank_holiday_operation = vec![ALL_BANK_HOLIDAYS.into()];
        profile.bank_holiday_non_operation = vec!["MayDay".into()];
        // Also excluded by a special range, but the bank holiday rule comes first
        profile.special_non_operation = vec![DateRange::day(date(2025, 5, 5))];
        let table: BankHolidayTable = [(date(2025, 5, 5), "MayDay")].into_iter().collect();

        assert!(profile.should_show(date(2025, 5, 5), &table));

        let mut profile = weekdays();
        profile.bank_holiday_operation = vec!["MayDay".into()];
        profile.bank_holiday_non_operation = vec![ALL_BANK_HOLIDAYS.into()];
        assert!(!profile.should_show(date(2025, 5, 5), &table));
    }

    #[test]
    fn bank_holiday_cannot_override_weekday() {
        let mut profile = weekdays();
        profile.bank_holiday_operation = vec![ALL_BANK_HOLIDAYS.into()];
        let table: BankHolidayTable = [(date(2025, 12, 27), "Saturday")].into_iter().collect();

        assert!(!profile.should_show(date(2025, 12, 27), &table));
    }

    #[test]
    fn bank_holiday_only_profile() {
        let profile = OperatingProfile {
            bank_holiday_operation: vec!["ChristmasDay".into()],
            ..OperatingProfile::default()
        };
        let table: BankHolidayTable = [(date(2025, 12, 25), "ChristmasDay")].into_iter().collect();

        assert!(profile.should_show(date(2025, 12, 25), &table));
        assert!(!profile.should_show(date(2025, 12, 24), &table));
    }

    #[test]
    fn empty_profile_never_shows() {
        let profile = OperatingProfile::default();
        assert!(!profile.should_show(date(2025, 6, 4), &BankHolidayTable::new()));
    }

    #[test]
    fn special_non_operation_ranges() {
        let mut profile = weekdays();
        profile.special_non_operation =
            vec![DateRange::new(date(2025, 6, 2), Some(date(2025, 6, 6)))];
        let none = BankHolidayTable::new();

        assert!(!profile.should_show(date(2025, 6, 2), &none));
        assert!(!profile.should_show(date(2025, 6, 6), &none));
        assert!(profile.should_show(date(2025, 6, 9), &none));
    }

    #[test]
    fn open_ended_range_contains_later_dates() {
        let mut profile = weekdays();
        profile.special_non_operation = vec![DateRange::new(date(2025, 6, 2), None)];
        let none = BankHolidayTable::new();

        assert!(profile.should_show(date(2025, 5, 30), &none));
        assert!(!profile.should_show(date(2030, 1, 2), &none));
    }

    #[test]
    fn special_operation_only() {
        let profile = OperatingProfile {
            special_operation: vec![DateRange::day(date(2025, 6, 8))],
            ..OperatingProfile::default()
        };
        let none = BankHolidayTable::new();

        assert!(profile.should_show(date(2025, 6, 8), &none));
        assert!(!profile.should_show(date(2025, 6, 9), &none));
    }

    #[test]
    fn school_days_only() {
        let mut profile = weekdays();
        profile.serviced_organisation = Some(ServicedOrganisationDayType {
            organisation: school(),
            operation: Some(OrganisationDays::WorkingDays),
            non_operation: None,
        });
        let none = BankHolidayTable::new();

        assert!(profile.should_show(date(2025, 10, 1), &none));
        assert!(!profile.should_show(date(2025, 10, 28), &none));
        assert!(!profile.should_show(date(2025, 8, 27), &none));
    }

    #[test]
    fn school_holidays_excluded() {
        let mut profile = weekdays();
        profile.serviced_organisation = Some(ServicedOrganisationDayType {
            organisation: school(),
            operation: None,
            non_operation: Some(OrganisationDays::Holidays),
        });
        let none = BankHolidayTable::new();

        assert!(!profile.should_show(date(2025, 10, 28), &none));
        // Outside any listed range: falls through to the remaining rules
        assert!(profile.should_show(date(2025, 11, 4), &none));
    }

    #[test]
    fn organisation_operation_short_circuits_special_ranges() {
        let mut profile = weekdays();
        profile.special_non_operation = vec![DateRange::day(date(2025, 10, 1))];
        profile.serviced_organisation = Some(ServicedOrganisationDayType {
            organisation: school(),
            operation: Some(OrganisationDays::WorkingDays),
            non_operation: None,
        });

        assert!(profile.should_show(date(2025, 10, 1), &BankHolidayTable::new()));
    }

    #[test]
    fn deserialize_profile() {
        let json = r#"{
            "regular_days": "MondayToFriday",
            "special_non_operation": [{"start": "2025-12-22", "end": "2026-01-02"}],
            "bank_holiday_non_operation": ["AllBankHolidays"]
        }"#;
        let profile: OperatingProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.regular_days.len(), 5);
        assert!(!profile.should_show(date(2025, 12, 23), &BankHolidayTable::new()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_date()(offset in 0i64..3650) -> NaiveDate {
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
        }
    }

    prop_compose! {
        fn range()(start in valid_date(), len in prop::option::of(0i64..60)) -> DateRange {
            DateRange::new(start, len.map(|l| start + chrono::Duration::days(l)))
        }
    }

    prop_compose! {
        fn profile()(
            flags in 0u8..128,
            non_operation in prop::collection::vec(range(), 0..3),
            operation in prop::collection::vec(range(), 0..3),
        ) -> OperatingProfile {
            let mut days = DaysOfWeek::new();
            for (i, day) in DaysOfWeek::all().iter().enumerate() {
                if flags & (1 << i) != 0 {
                    days.insert(day);
                }
            }
            OperatingProfile {
                regular_days: days,
                special_non_operation: non_operation,
                special_operation: operation,
                ..OperatingProfile::default()
            }
        }
    }

    proptest! {
        /// The verdict is a pure function of (profile, date)
        #[test]
        fn should_show_is_pure(profile in profile(), date in valid_date()) {
            let table = BankHolidayTable::new();
            let first = profile.should_show(date, &table);
            prop_assert_eq!(first, profile.clone().should_show(date, &table));
            prop_assert_eq!(first, profile.should_show(date, &table));
        }

        /// A date excluded by the weekly pattern never shows
        #[test]
        fn weekday_absent_never_shows(profile in profile(), date in valid_date()) {
            let table = BankHolidayTable::new();
            if !profile.regular_days.is_empty() && !profile.regular_days.contains(date.weekday()) {
                prop_assert!(!profile.should_show(date, &table));
            }
        }

        /// Open ranges contain every later date
        #[test]
        fn open_range_contains_later(start in valid_date(), days in 0i64..10_000) {
            let range = DateRange::new(start, None);
            prop_assert!(range.contains(start + chrono::Duration::days(days)));
        }
    }
}
