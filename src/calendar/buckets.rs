use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::month::{bucket_date, UndatedPolicy, YearMonth};
use crate::models::Task;

/// Pills shown per day cell before collapsing into "+N more".
pub const PILL_LIMIT: usize = 3;

/// One day of the month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    date: NaiveDate,
    is_today: bool,
    tasks: Vec<Task>,
}

impl DayCell {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_today(&self) -> bool {
        self.is_today
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    /// All tasks of the day, in snapshot order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The first tasks of the day, in snapshot order (no re-sorting).
    pub fn pills(&self) -> &[Task] {
        &self.tasks[..self.tasks.len().min(PILL_LIMIT)]
    }

    /// Number of tasks hidden behind the pills.
    pub fn overflow(&self) -> usize {
        self.tasks.len().saturating_sub(PILL_LIMIT)
    }

    pub fn more_label(&self) -> Option<String> {
        match self.overflow() {
            0 => None,
            n => Some(format!("+{n} more")),
        }
    }
}

impl Serialize for DayCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut cell = serializer.serialize_struct("DayCell", 6)?;
        cell.serialize_field("date", &self.date)?;
        cell.serialize_field("is_today", &self.is_today)?;
        cell.serialize_field("count", &self.count())?;
        cell.serialize_field("pills", self.pills())?;
        cell.serialize_field("overflow", &self.overflow())?;
        cell.serialize_field("more_label", &self.more_label())?;
        cell.end()
    }
}

/// A month of day cells keyed by day-of-month, every day present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBuckets {
    month: YearMonth,
    leading_blanks: u32,
    days: BTreeMap<u32, DayCell>,
}

impl MonthBuckets {
    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn leading_blanks(&self) -> u32 {
        self.leading_blanks
    }

    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.days.get(&day)
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.days.values()
    }

    /// Tasks filed anywhere in the month.
    pub fn total(&self) -> usize {
        self.days.values().map(DayCell::count).sum()
    }
}

/// Files each task under its bucket date and keeps the ones inside `month`.
pub fn bucket_by_date(
    tasks: &[Task],
    month: YearMonth,
    today: NaiveDate,
    policy: UndatedPolicy,
) -> MonthBuckets {
    let mut days: BTreeMap<u32, DayCell> = (1..=month.days_in_month())
        .filter_map(|day| month.date(day))
        .map(|date| {
            let cell = DayCell { date, is_today: date == today, tasks: Vec::new() };
            (date.day(), cell)
        })
        .collect();

    for task in tasks {
        let Some(date) = bucket_date(task, today, policy) else {
            continue;
        };
        if !month.contains(date) {
            continue;
        }
        if let Some(cell) = days.get_mut(&date.day()) {
            cell.tasks.push(task.clone());
        }
    }

    MonthBuckets { month, leading_blanks: month.leading_blanks(), days }
}

/// Every task filed under `date`, uncapped.
pub fn tasks_on(tasks: &[Task], date: NaiveDate, today: NaiveDate, policy: UndatedPolicy) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| bucket_date(task, today, policy) == Some(date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn march() -> YearMonth {
        YearMonth::new(2025, 3).unwrap()
    }

    #[test]
    fn every_day_of_the_month_has_a_cell() {
        let buckets = bucket_by_date(&[], march(), date(2025, 3, 10), UndatedPolicy::Today);
        assert_eq!(buckets.days().count(), 31);
        assert!(buckets.day(10).unwrap().is_today());
        assert!(!buckets.day(11).unwrap().is_today());
        assert!(buckets.day(32).is_none());
        assert_eq!(buckets.leading_blanks(), 6);
    }

    #[test]
    fn pills_keep_snapshot_order_and_report_overflow() {
        let tasks: Vec<Task> = ["e", "d", "c", "b", "a"]
            .iter()
            .map(|id| Task::new(*id, format!("task {id}"), "u1").with_deadline(date(2025, 3, 7)))
            .collect();
        let buckets = bucket_by_date(&tasks, march(), date(2025, 1, 1), UndatedPolicy::Today);
        let cell = buckets.day(7).unwrap();
        assert_eq!(cell.count(), 5);
        let pill_ids: Vec<&str> = cell.pills().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(pill_ids, vec!["e", "d", "c"]);
        assert_eq!(cell.overflow(), 2);
        assert_eq!(cell.more_label().as_deref(), Some("+2 more"));

        let json = serde_json::to_value(cell).unwrap();
        assert_eq!(json["count"], 5);
        assert_eq!(json["pills"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn three_or_fewer_tasks_have_no_overflow() {
        let tasks: Vec<Task> = (0..3)
            .map(|i| Task::new(format!("t{i}"), "x", "u1").with_deadline(date(2025, 3, 2)))
            .collect();
        let buckets = bucket_by_date(&tasks, march(), date(2025, 1, 1), UndatedPolicy::Today);
        let cell = buckets.day(2).unwrap();
        assert_eq!(cell.pills().len(), 3);
        assert_eq!(cell.more_label(), None);
    }

    #[test]
    fn tasks_outside_the_month_are_dropped() {
        let tasks = vec![
            Task::new("a", "x", "u1").with_deadline(date(2025, 2, 28)),
            Task::new("b", "x", "u1").with_deadline(date(2025, 3, 31)),
            Task::new("c", "x", "u1").with_deadline(date(2024, 3, 31)),
        ];
        let buckets = bucket_by_date(&tasks, march(), date(2025, 1, 1), UndatedPolicy::Today);
        assert_eq!(buckets.total(), 1);
        assert_eq!(buckets.day(31).unwrap().tasks()[0].id, "b");
    }

    #[test]
    fn undated_tasks_follow_the_policy() {
        let tasks = vec![Task::new("draft", "x", "u1")];
        let today = date(2025, 3, 12);
        let shown = bucket_by_date(&tasks, march(), today, UndatedPolicy::Today);
        assert_eq!(shown.day(12).unwrap().count(), 1);
        let hidden = bucket_by_date(&tasks, march(), today, UndatedPolicy::Exclude);
        assert_eq!(hidden.total(), 0);
    }

    #[test]
    fn millisecond_ids_are_filed_by_their_timestamp() {
        // 2025-03-20T12:00:00Z and 2025-04-02T00:00:00Z
        let tasks = vec![Task::new("1742472000000", "x", "u1"), Task::new("1743552000000", "x", "u1")];
        let buckets = bucket_by_date(&tasks, march(), date(2025, 3, 1), UndatedPolicy::Exclude);
        assert_eq!(buckets.total(), 1);
        assert_eq!(buckets.day(20).unwrap().tasks()[0].id, "1742472000000");
        assert_eq!(buckets.day(1).unwrap().count(), 0);
    }

    #[test]
    fn day_list_is_uncapped() {
        let tasks: Vec<Task> = (0..7)
            .map(|i| Task::new(format!("t{i}"), "x", "u1").with_deadline(date(2025, 3, 9)))
            .collect();
        assert_eq!(tasks_on(&tasks, date(2025, 3, 9), date(2025, 1, 1), UndatedPolicy::Today).len(), 7);
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        prop_oneof![
            // Deadlines from December through May.
            (0..182u64).prop_map(|offset| {
                Task::new("dated", "x", "u1").with_deadline(date(2024, 12, 1) + Days::new(offset))
            }),
            // Legacy millisecond ids, late 2024 to mid 2025.
            (1_730_000_000_000i64..1_750_000_000_000i64).prop_map(|ms| Task::new(ms.to_string(), "x", "u1")),
            Just(Task::new("draft", "x", "u1")),
        ]
    }

    fn arb_policy() -> impl Strategy<Value = UndatedPolicy> {
        prop_oneof![Just(UndatedPolicy::Today), Just(UndatedPolicy::Exclude)]
    }

    proptest! {
        #[test]
        fn prop_cells_contain_exactly_the_tasks_dated_that_day(
            tasks in proptest::collection::vec(arb_task(), 0..30),
            today_offset in 0..120u64,
            policy in arb_policy(),
        ) {
            let today = date(2025, 1, 15) + Days::new(today_offset);
            let buckets = bucket_by_date(&tasks, march(), today, policy);
            for day in 1..=31u32 {
                let on_day = date(2025, 3, day);
                let cell = buckets.day(day).unwrap();
                prop_assert_eq!(cell.is_today(), on_day == today);
                for task in &tasks {
                    let dated_here = bucket_date(task, today, policy) == Some(on_day);
                    prop_assert_eq!(cell.tasks().contains(task), dated_here);
                }
            }
            let in_march = tasks
                .iter()
                .filter(|t| bucket_date(t, today, policy).is_some_and(|d| march().contains(d)))
                .count();
            prop_assert_eq!(buckets.total(), in_march);
        }
    }
}
