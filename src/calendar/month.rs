use std::fmt;

use chrono::{DateTime, Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::models::Task;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// A validated calendar month. Construction is the only place where a
/// `(year, month)` pair is checked; everything downstream trusts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "MonthRef", try_from = "MonthRef")]
pub struct YearMonth {
    first: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MonthRef {
    year: i32,
    month: u32,
}

impl From<YearMonth> for MonthRef {
    fn from(ym: YearMonth) -> Self {
        MonthRef { year: ym.year(), month: ym.month() }
    }
}

impl TryFrom<MonthRef> for YearMonth {
    type Error = BoardError;

    fn try_from(raw: MonthRef) -> Result<Self, Self::Error> {
        YearMonth::new(raw.year, raw.month)
    }
}

impl YearMonth {
    /// `month` is 1-based (January = 1).
    pub fn new(year: i32, month: u32) -> Result<Self, BoardError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(BoardError::InvalidDateRange { year, month });
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| YearMonth { first })
            .ok_or(BoardError::InvalidDateRange { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth { first: date.with_day(1).unwrap_or(date) }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    pub fn month(self) -> u32 {
        self.first.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn last_day(self) -> NaiveDate {
        self.first + chrono::Days::new(u64::from(self.days_in_month() - 1))
    }

    /// Next calendar month; stays put at the upper year bound.
    pub fn next(self) -> Self {
        self.shift(self.first.checked_add_months(Months::new(1)))
    }

    /// Previous calendar month; stays put at the lower year bound.
    pub fn prev(self) -> Self {
        self.shift(self.first.checked_sub_months(Months::new(1)))
    }

    fn shift(self, target: Option<NaiveDate>) -> Self {
        match target {
            Some(first) if (MIN_YEAR..=MAX_YEAR).contains(&first.year()) => YearMonth { first },
            _ => self,
        }
    }

    pub fn days_in_month(self) -> u32 {
        match self.month() {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year()) => 29,
            2 => 28,
            _ => 31,
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn date(self, day: u32) -> Option<NaiveDate> {
        self.first.with_day(day)
    }

    /// Empty grid cells before day 1 in a Sunday-first week layout.
    pub fn leading_blanks(self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// What to do with a task that has neither a deadline nor a timestamp id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndatedPolicy {
    /// Show it on today's cell.
    #[default]
    Today,
    /// Leave it off the calendar.
    Exclude,
}

impl UndatedPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "today" => Some(UndatedPolicy::Today),
            "exclude" => Some(UndatedPolicy::Exclude),
            _ => None,
        }
    }
}

/// The calendar date a task is filed under.
///
/// Fallback chain: the deadline, then the id read as a millisecond epoch
/// timestamp (legacy records carried no other date), then `today` unless the
/// policy excludes undated tasks.
pub fn bucket_date(task: &Task, today: NaiveDate, policy: UndatedPolicy) -> Option<NaiveDate> {
    if let Some(deadline) = task.deadline {
        return Some(deadline);
    }
    if let Some(stamped) = epoch_id_date(&task.id) {
        return Some(stamped);
    }
    match policy {
        UndatedPolicy::Today => Some(today),
        UndatedPolicy::Exclude => None,
    }
}

/// Date encoded by a legacy all-digit id (milliseconds since the epoch, UTC).
pub fn epoch_id_date(id: &str) -> Option<NaiveDate> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: i64 = id.parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_navigation_rolls_over_years() {
        let december = YearMonth::new(2024, 12).unwrap();
        assert_eq!(december.next(), YearMonth::new(2025, 1).unwrap());
        assert_eq!(YearMonth::new(2025, 1).unwrap().prev(), december);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(1900, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(2000, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2025, 4).unwrap().days_in_month(), 30);
        assert_eq!(YearMonth::new(2025, 1).unwrap().last_day(), date(2025, 1, 31));
    }

    #[test]
    fn out_of_range_months_are_rejected() {
        assert!(matches!(
            YearMonth::new(2025, 13),
            Err(BoardError::InvalidDateRange { year: 2025, month: 13 })
        ));
        assert!(YearMonth::new(2025, 0).is_err());
        assert!(YearMonth::new(0, 5).is_err());
    }

    #[test]
    fn navigation_saturates_at_year_bounds() {
        let last = YearMonth::new(9999, 12).unwrap();
        assert_eq!(last.next(), last);
        let first = YearMonth::new(1, 1).unwrap();
        assert_eq!(first.prev(), first);
    }

    #[test]
    fn leading_blanks_follow_sunday_first_layout() {
        // 1 June 2025 is a Sunday, 1 March 2025 a Saturday.
        assert_eq!(YearMonth::new(2025, 6).unwrap().leading_blanks(), 0);
        assert_eq!(YearMonth::new(2025, 3).unwrap().leading_blanks(), 6);
    }

    #[test]
    fn serializes_as_year_and_month() {
        let ym = YearMonth::new(2025, 3).unwrap();
        assert_eq!(serde_json::to_value(ym).unwrap(), serde_json::json!({"year": 2025, "month": 3}));
        assert!(serde_json::from_str::<YearMonth>(r#"{"year":2025,"month":13}"#).is_err());
    }

    #[test]
    fn bucket_date_fallback_chain() {
        let today = date(2025, 6, 15);
        let dated = Task::new("abc", "x", "u1").with_deadline(date(2025, 3, 5));
        assert_eq!(bucket_date(&dated, today, UndatedPolicy::Today), Some(date(2025, 3, 5)));

        // 1_709_251_200_000 ms = 2024-03-01T00:00:00Z
        let stamped = Task::new("1709251200000", "x", "u1");
        assert_eq!(bucket_date(&stamped, today, UndatedPolicy::Today), Some(date(2024, 3, 1)));

        let undated = Task::new("a1b2", "x", "u1");
        assert_eq!(bucket_date(&undated, today, UndatedPolicy::Today), Some(today));
        assert_eq!(bucket_date(&undated, today, UndatedPolicy::Exclude), None);
    }
}
