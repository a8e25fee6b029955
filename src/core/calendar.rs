use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Weekday names in grid column order (Sunday first).
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid date {0:?}, expected yyyy-MM-dd")]
    InvalidDate(String),
}

/// A calendar month. The month is always in `1..=12`; out-of-range input is
/// carried into the year by [`YearMonth::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Normalize `(year, month)` so that month 0 is December of the previous
    /// year, month 13 is January of the next one, and so on.
    pub fn new(year: i32, month: i32) -> Self {
        Self::from_month_index(i64::from(year) * 12 + i64::from(month) - 1)
    }

    pub fn today() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    // Saturates at the ends of the i32 year range.
    fn from_month_index(index: i64) -> Self {
        let year = index.div_euclid(12);
        if year > i64::from(i32::MAX) {
            return Self { year: i32::MAX, month: 12 };
        }
        if year < i64::from(i32::MIN) {
            return Self { year: i32::MIN, month: 1 };
        }
        Self {
            year: year as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    fn month_index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Move by `delta` months in either direction.
    pub fn navigate(self, delta: i32) -> Self {
        Self::from_month_index(self.month_index() + i64::from(delta))
    }

    pub fn days(self) -> u32 {
        match self.month {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year) => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// `None` only for years chrono cannot represent.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.days())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", month_name(self.month as i32, self.year), self.year)
    }
}

/// Which month a grid cell belongs to, relative to the displayed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayKind {
    Previous,
    Current,
    Next,
}

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub kind: DayKind,
}

impl MonthDay {
    fn new(date: NaiveDate, kind: DayKind) -> Self {
        Self {
            date,
            day_of_month: date.day(),
            kind,
        }
    }

    /// Canonical `yyyy-MM-dd` identity of the cell.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn is_current_month(&self) -> bool {
        self.kind == DayKind::Current
    }

    pub fn is_previous_month(&self) -> bool {
        self.kind == DayKind::Previous
    }

    pub fn is_next_month(&self) -> bool {
        self.kind == DayKind::Next
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthDayRepr {
    date_string: String,
    day_of_month: u32,
    is_current_month: bool,
    is_previous_month: bool,
    is_next_month: bool,
}

impl Serialize for MonthDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MonthDayRepr {
            date_string: self.date_string(),
            day_of_month: self.day_of_month,
            is_current_month: self.is_current_month(),
            is_previous_month: self.is_previous_month(),
            is_next_month: self.is_next_month(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: i32,
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: i32) -> u32 {
    YearMonth::new(year, month).days()
}

/// Parse `yyyy-MM-dd` as a plain calendar date, with no time zone involved.
pub fn parse_date_string(date_string: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(date_string.trim(), DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(date_string.to_string()))
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn weekday_of(date_string: &str) -> Result<u32, CalendarError> {
    parse_date_string(date_string).map(weekday_index)
}

pub fn is_weekend_day(date_string: &str) -> Result<bool, CalendarError> {
    weekday_of(date_string).map(|day| day == 0 || day == 6)
}

fn month_cells(ym: YearMonth, days: impl Iterator<Item = u32>, kind: DayKind) -> Vec<MonthDay> {
    days.filter_map(|day| NaiveDate::from_ymd_opt(ym.year(), ym.month(), day))
        .map(|date| MonthDay::new(date, kind))
        .collect()
}

pub fn current_month_days(year: i32, month: i32) -> Vec<MonthDay> {
    let ym = YearMonth::new(year, month);
    month_cells(ym, 1..=ym.days(), DayKind::Current)
}

/// Trailing days of the previous month that fill the first week row.
pub fn previous_month_days(year: i32, month: i32, current_month_days: &[MonthDay]) -> Vec<MonthDay> {
    let ym = YearMonth::new(year, month);
    let first = match current_month_days.first() {
        Some(day) => day.date,
        None => match ym.first_day() {
            Some(date) => date,
            None => return Vec::new(),
        },
    };

    let count = weekday_index(first);
    let previous = ym.navigate(-1);
    let last = previous.days();
    month_cells(previous, (last + 1 - count)..=last, DayKind::Previous)
}

/// Leading days of the next month that complete the last week row.
pub fn next_month_days(year: i32, month: i32, current_month_days: &[MonthDay]) -> Vec<MonthDay> {
    let ym = YearMonth::new(year, month);
    let last = match current_month_days.last() {
        Some(day) => day.date,
        None => match ym.last_day() {
            Some(date) => date,
            None => return Vec::new(),
        },
    };

    let count = 6 - weekday_index(last);
    month_cells(ym.navigate(1), 1..=count, DayKind::Next)
}

/// Every cell of a Sunday-first, 7-column month view. Empty when the month
/// or either neighbour lies outside chrono's date range.
pub fn build_grid(year: i32, month: i32) -> Vec<MonthDay> {
    let ym = YearMonth::new(year, month);
    if ym.navigate(-1).last_day().is_none() || ym.navigate(1).first_day().is_none() {
        return Vec::new();
    }

    let current = current_month_days(year, month);
    let mut grid = previous_month_days(year, month, &current);
    let next = next_month_days(year, month, &current);
    grid.extend(current);
    grid.extend(next);
    grid
}

pub fn navigate_month(year: i32, month: i32, delta: i32) -> YearMonth {
    YearMonth::new(year, month).navigate(delta)
}

/// Full month name. The year has no effect on the result.
pub fn month_name(month: i32, _year: i32) -> String {
    let ym = YearMonth::new(2000, month);
    NaiveDate::from_ymd_opt(2000, ym.month(), 1)
        .map(|date| date.format("%B").to_string())
        .unwrap_or_default()
}

pub fn month_dropdown_options() -> Vec<DropdownOption> {
    (1..=12)
        .map(|month| DropdownOption {
            label: month_name(month, 2020),
            value: month,
        })
        .collect()
}

/// Ten years from `current_year - 4`. Near the ends of the i32 range the
/// window shifts inward instead of shrinking.
pub fn year_dropdown_options(current_year: i32) -> Vec<DropdownOption> {
    let first = current_year.clamp(i32::MIN + 4, i32::MAX - 5) - 4;
    (first..=first + 9)
        .map(|year| DropdownOption {
            label: year.to_string(),
            value: year,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn count(grid: &[MonthDay], kind: DayKind) -> usize {
        grid.iter().filter(|d| d.kind == kind).count()
    }

    #[test]
    fn grid_is_whole_weeks_from_sunday_to_saturday() {
        for year in [1900, 1999, 2000, 2023, 2024, 2025, 2100] {
            for month in 1..=12 {
                let grid = build_grid(year, month);
                assert_eq!(grid.len() % 7, 0, "{year}-{month}");
                assert_eq!(weekday_of(&grid[0].date_string()), Ok(0));
                assert_eq!(weekday_of(&grid[grid.len() - 1].date_string()), Ok(6));
                assert_eq!(count(&grid, DayKind::Current), days_in_month(year, month) as usize);
            }
        }
    }

    #[test]
    fn cells_are_consecutive_and_unique() {
        let grid = build_grid(2025, 3);
        for pair in grid.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn exactly_one_kind_per_cell() {
        for day in build_grid(2024, 7) {
            let flags = [day.is_previous_month(), day.is_current_month(), day.is_next_month()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn october_2023_starts_on_sunday() {
        let grid = build_grid(2023, 10);
        assert_eq!(grid.len(), 35);
        assert_eq!(count(&grid, DayKind::Previous), 0);
        assert_eq!(count(&grid, DayKind::Current), 31);
        let next: Vec<String> = grid
            .iter()
            .filter(|d| d.is_next_month())
            .map(MonthDay::date_string)
            .collect();
        assert_eq!(next, vec!["2023-11-01", "2023-11-02", "2023-11-03", "2023-11-04"]);
    }

    #[test]
    fn february_2024_leap_year() {
        let grid = build_grid(2024, 2);
        let previous: Vec<u32> = grid
            .iter()
            .filter(|d| d.is_previous_month())
            .map(|d| d.day_of_month)
            .collect();
        assert_eq!(previous, vec![28, 29, 30, 31]);
        assert_eq!(grid[0].date, date(2024, 1, 28));
        assert_eq!(count(&grid, DayKind::Current), 29);
        // Feb 29 2024 is a Thursday, so Friday and Saturday close the row.
        let next: Vec<NaiveDate> = grid.iter().filter(|d| d.is_next_month()).map(|d| d.date).collect();
        assert_eq!(next, vec![date(2024, 3, 1), date(2024, 3, 2)]);
        assert_eq!(grid.len(), 35);
    }

    #[test]
    fn month_ending_on_saturday_has_no_next_filler() {
        let current = current_month_days(2024, 8);
        assert!(next_month_days(2024, 8, &current).is_empty());
        assert_eq!(build_grid(2024, 8).last().map(|d| d.date), Some(date(2024, 8, 31)));
    }

    #[test]
    fn fillers_roll_over_the_year() {
        let january = build_grid(2025, 1);
        let previous: Vec<NaiveDate> = january
            .iter()
            .filter(|d| d.is_previous_month())
            .map(|d| d.date)
            .collect();
        assert_eq!(previous, vec![date(2024, 12, 29), date(2024, 12, 30), date(2024, 12, 31)]);

        let december = build_grid(2025, 12);
        let next: Vec<NaiveDate> = december.iter().filter(|d| d.is_next_month()).map(|d| d.date).collect();
        assert_eq!(next, vec![date(2026, 1, 1), date(2026, 1, 2), date(2026, 1, 3)]);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn navigate_wraps_months() {
        assert_eq!(navigate_month(2024, 1, -1), YearMonth::new(2023, 12));
        assert_eq!(navigate_month(2024, 12, 1), YearMonth::new(2025, 1));
        assert_eq!(navigate_month(2024, 6, 18), YearMonth::new(2025, 12));
        assert_eq!(navigate_month(2024, 6, -30), YearMonth::new(2021, 12));
        let ym = navigate_month(2024, 3, -2);
        assert_eq!((ym.year(), ym.month()), (2024, 1));
    }

    #[test]
    fn out_of_range_months_are_normalized() {
        let ym = YearMonth::new(2024, 0);
        assert_eq!((ym.year(), ym.month()), (2023, 12));
        let ym = YearMonth::new(2024, 13);
        assert_eq!((ym.year(), ym.month()), (2025, 1));
        let ym = YearMonth::new(2024, -11);
        assert_eq!((ym.year(), ym.month()), (2023, 1));

        assert_eq!(build_grid(2024, 13), build_grid(2025, 1));
        assert_eq!(days_in_month(2023, 14), days_in_month(2024, 2));

        let current = current_month_days(2025, 1);
        assert_eq!(
            previous_month_days(2024, 13, &current),
            previous_month_days(2025, 1, &current)
        );
        assert_eq!(next_month_days(2024, 13, &current), next_month_days(2025, 1, &current));
    }

    #[test]
    fn months_at_the_edge_of_chrono_range_give_empty_grids() {
        assert!(build_grid(NaiveDate::MAX.year(), 12).is_empty());
        assert!(build_grid(NaiveDate::MIN.year(), 1).is_empty());
        assert!(build_grid(i32::MAX, 6).is_empty());

        let inner = build_grid(NaiveDate::MAX.year(), 11);
        assert_eq!(inner.len() % 7, 0);
        assert_eq!(count(&inner, DayKind::Current), 30);
    }

    #[test]
    fn year_saturates_at_i32_bounds() {
        let ym = YearMonth::new(i32::MAX, 13);
        assert_eq!((ym.year(), ym.month()), (i32::MAX, 12));
        let ym = YearMonth::new(i32::MIN, 0);
        assert_eq!((ym.year(), ym.month()), (i32::MIN, 1));
        let ym = YearMonth::new(i32::MAX, 12).navigate(1);
        assert_eq!((ym.year(), ym.month()), (i32::MAX, 12));
    }

    #[test]
    fn build_grid_is_idempotent() {
        assert_eq!(build_grid(2026, 10), build_grid(2026, 10));
    }

    #[test]
    fn weekday_of_parses_plain_dates() {
        assert_eq!(weekday_of("2023-10-01"), Ok(0));
        assert_eq!(weekday_of("2024-02-29"), Ok(4));
        assert!(weekday_of("2024-02-30").is_err());
        assert!(weekday_of("yesterday").is_err());
        assert_eq!(is_weekend_day("2024-08-31"), Ok(true));
        assert_eq!(is_weekend_day("2024-08-30"), Ok(false));
    }

    #[test]
    fn dropdown_options() {
        let years: Vec<i32> = year_dropdown_options(2024).iter().map(|o| o.value).collect();
        assert_eq!(years, (2020..=2029).collect::<Vec<_>>());
        assert_eq!(year_dropdown_options(2024)[0].label, "2020");

        let top = year_dropdown_options(i32::MAX);
        assert_eq!(top.len(), 10);
        assert_eq!(top.last().map(|o| o.value), Some(i32::MAX));
        let bottom = year_dropdown_options(i32::MIN);
        assert_eq!(bottom.len(), 10);
        assert_eq!(bottom[0].value, i32::MIN);

        let months = month_dropdown_options();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], DropdownOption { label: "January".into(), value: 1 });
        assert_eq!(months[11].label, "December");
    }

    #[test]
    fn month_name_ignores_year() {
        assert_eq!(month_name(10, 2023), "October");
        assert_eq!(month_name(10, 1850), "October");
        assert_eq!(YearMonth::new(2023, 10).to_string(), "October 2023");
    }

    #[test]
    fn month_day_serializes_with_flags() {
        let grid = build_grid(2023, 10);
        let json = serde_json::to_value(&grid[0]).unwrap();
        assert_eq!(json["dateString"], "2023-10-01");
        assert_eq!(json["dayOfMonth"], 1);
        assert_eq!(json["isCurrentMonth"], true);
        assert_eq!(json["isPreviousMonth"], false);
        assert_eq!(json["isNextMonth"], false);
    }
}
