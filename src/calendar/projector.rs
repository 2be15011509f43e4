use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use super::buckets::{bucket_by_date, tasks_on, MonthBuckets};
use super::month::{UndatedPolicy, YearMonth};
use crate::error::BoardError;
use crate::models::{Role, Task, User};

/// Where the calendar currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CalendarView {
    Month { month: YearMonth },
    /// `month` is the month view that "back" returns to.
    DayDetail { date: NaiveDate, month: YearMonth },
}

impl CalendarView {
    pub fn month(&self) -> YearMonth {
        match *self {
            CalendarView::Month { month } | CalendarView::DayDetail { month, .. } => month,
        }
    }
}

/// The full list for a single day plus the quick-add gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    /// Only Admins get the "add task on this day" affordance.
    pub can_quick_add: bool,
}

/// Navigation commands as sent by the presentation layer, with the month
/// still in raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CalendarCommand {
    OpenMonth { year: i32, month: u32 },
    NextMonth,
    PrevMonth,
    OpenDay { date: NaiveDate },
    NextDay,
    PrevDay,
    Back,
}

impl CalendarCommand {
    /// Rejects out-of-range months so the projector only sees valid input.
    pub fn validate(self) -> Result<Navigation, BoardError> {
        Ok(match self {
            CalendarCommand::OpenMonth { year, month } => Navigation::OpenMonth(YearMonth::new(year, month)?),
            CalendarCommand::NextMonth => Navigation::NextMonth,
            CalendarCommand::PrevMonth => Navigation::PrevMonth,
            CalendarCommand::OpenDay { date } => Navigation::OpenDay(date),
            CalendarCommand::NextDay => Navigation::NextDay,
            CalendarCommand::PrevDay => Navigation::PrevDay,
            CalendarCommand::Back => Navigation::Back,
        })
    }
}

/// A validated navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    OpenMonth(YearMonth),
    NextMonth,
    PrevMonth,
    OpenDay(NaiveDate),
    NextDay,
    PrevDay,
    Back,
}

/// Month/day navigation over an already scoped task snapshot.
///
/// Every transition that changes the visible month re-buckets before the
/// new view is stored, so a caller never observes a view whose buckets
/// belong to another month.
#[derive(Debug, Clone)]
pub struct CalendarProjector {
    view: CalendarView,
    tasks: Vec<Task>,
    buckets: MonthBuckets,
    today: NaiveDate,
    policy: UndatedPolicy,
}

impl CalendarProjector {
    /// Starts on the month containing `today`.
    pub fn new(today: NaiveDate, policy: UndatedPolicy) -> Self {
        let month = YearMonth::of(today);
        CalendarProjector {
            view: CalendarView::Month { month },
            tasks: Vec::new(),
            buckets: bucket_by_date(&[], month, today, policy),
            today,
            policy,
        }
    }

    pub fn view(&self) -> CalendarView {
        self.view
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Swaps in a fresh snapshot. This is a full replace, never a merge.
    ///
    /// `today` is taken again on every refresh so a long-lived projector
    /// follows the wall clock across midnight.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>, today: NaiveDate) {
        self.tasks = tasks;
        self.today = today;
        self.buckets = self.bucket(self.view.month());
    }

    fn bucket(&self, month: YearMonth) -> MonthBuckets {
        bucket_by_date(&self.tasks, month, self.today, self.policy)
    }

    fn show(&mut self, view: CalendarView) {
        if view.month() != self.buckets.month() {
            self.buckets = self.bucket(view.month());
        }
        self.view = view;
    }

    pub fn open_month(&mut self, month: YearMonth) {
        self.show(CalendarView::Month { month });
    }

    /// Only valid from the month view.
    pub fn next_month(&mut self) -> bool {
        match self.view {
            CalendarView::Month { month } => {
                self.open_month(month.next());
                true
            }
            CalendarView::DayDetail { .. } => {
                debug!("next_month ignored in day detail");
                false
            }
        }
    }

    /// Only valid from the month view.
    pub fn prev_month(&mut self) -> bool {
        match self.view {
            CalendarView::Month { month } => {
                self.open_month(month.prev());
                true
            }
            CalendarView::DayDetail { .. } => {
                debug!("prev_month ignored in day detail");
                false
            }
        }
    }

    /// Opens a day. A date outside the displayed month moves the month
    /// view along with it.
    pub fn open_day(&mut self, date: NaiveDate) {
        self.show(CalendarView::DayDetail { date, month: YearMonth::of(date) });
    }

    /// Only valid from day detail.
    pub fn next_day(&mut self) -> bool {
        self.step_day(|date| date.checked_add_days(Days::new(1)))
    }

    /// Only valid from day detail.
    pub fn prev_day(&mut self) -> bool {
        self.step_day(|date| date.checked_sub_days(Days::new(1)))
    }

    fn step_day(&mut self, step: impl Fn(NaiveDate) -> Option<NaiveDate>) -> bool {
        let CalendarView::DayDetail { date, .. } = self.view else {
            debug!("day navigation ignored in month view");
            return false;
        };
        match step(date) {
            Some(next) => {
                self.open_day(next);
                true
            }
            None => false,
        }
    }

    /// Day detail back to the remembered month view.
    pub fn back(&mut self) -> bool {
        match self.view {
            CalendarView::DayDetail { month, .. } => {
                self.show(CalendarView::Month { month });
                true
            }
            CalendarView::Month { .. } => false,
        }
    }

    /// Returns whether the step was valid in the current state.
    pub fn apply(&mut self, step: Navigation) -> bool {
        match step {
            Navigation::OpenMonth(month) => {
                self.open_month(month);
                true
            }
            Navigation::NextMonth => self.next_month(),
            Navigation::PrevMonth => self.prev_month(),
            Navigation::OpenDay(date) => {
                self.open_day(date);
                true
            }
            Navigation::NextDay => self.next_day(),
            Navigation::PrevDay => self.prev_day(),
            Navigation::Back => self.back(),
        }
    }

    pub fn visible_buckets(&self) -> &MonthBuckets {
        &self.buckets
    }

    /// The selected day, when in day detail.
    pub fn day_detail(&self, actor: Option<&User>) -> Option<DayDetail> {
        let CalendarView::DayDetail { date, .. } = self.view else {
            return None;
        };
        Some(DayDetail {
            date,
            tasks: tasks_on(&self.tasks, date, self.today, self.policy),
            can_quick_add: actor.is_some_and(|a| a.role == Role::Admin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::AccessScope;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn projector_at(today: NaiveDate) -> CalendarProjector {
        CalendarProjector::new(today, UndatedPolicy::Today)
    }

    #[test]
    fn starts_on_the_month_of_today() {
        let cal = projector_at(date(2025, 3, 18));
        assert_eq!(cal.view(), CalendarView::Month { month: ym(2025, 3) });
        assert_eq!(cal.visible_buckets().month(), ym(2025, 3));
        assert!(cal.day_detail(None).is_none());
    }

    #[test]
    fn month_navigation_crosses_year_boundaries() {
        let mut cal = projector_at(date(2024, 12, 10));
        assert!(cal.next_month());
        assert_eq!(cal.view(), CalendarView::Month { month: ym(2025, 1) });
        assert!(cal.prev_month());
        assert_eq!(cal.view(), CalendarView::Month { month: ym(2024, 12) });
        assert_eq!(cal.visible_buckets().month(), ym(2024, 12));
    }

    #[test]
    fn next_day_across_month_end_rebuckets() {
        let feb_task = Task::new("f", "Post", "u1").with_deadline(date(2025, 2, 1));
        let mut cal = projector_at(date(2025, 1, 10));
        cal.replace_tasks(vec![feb_task.clone()], cal.today());

        cal.open_day(date(2025, 1, 31));
        assert_eq!(cal.visible_buckets().month(), ym(2025, 1));
        assert!(cal.next_day());

        assert_eq!(cal.view(), CalendarView::DayDetail { date: date(2025, 2, 1), month: ym(2025, 2) });
        assert_eq!(cal.visible_buckets().month(), ym(2025, 2));
        assert_eq!(cal.visible_buckets().day(1).unwrap().tasks(), &[feb_task.clone()]);
        assert_eq!(cal.day_detail(None).unwrap().tasks, vec![feb_task]);

        assert!(cal.prev_day());
        assert_eq!(cal.visible_buckets().month(), ym(2025, 1));
    }

    #[test]
    fn back_returns_to_the_month_day_detail_came_from() {
        let mut cal = projector_at(date(2025, 1, 10));
        cal.open_month(ym(2025, 5));
        cal.open_day(date(2025, 5, 20));
        assert!(cal.back());
        assert_eq!(cal.view(), CalendarView::Month { month: ym(2025, 5) });
        assert!(!cal.back());
    }

    #[test]
    fn restricted_transitions_are_ignored_in_the_wrong_state() {
        let mut cal = projector_at(date(2025, 1, 10));
        assert!(!cal.next_day());
        assert!(!cal.prev_day());
        cal.open_day(date(2025, 1, 12));
        assert!(!cal.next_month());
        assert!(!cal.prev_month());
        assert_eq!(cal.view(), CalendarView::DayDetail { date: date(2025, 1, 12), month: ym(2025, 1) });
    }

    #[test]
    fn quick_add_is_admin_only() {
        let mut cal = projector_at(date(2025, 1, 10));
        cal.open_day(date(2025, 1, 10));
        let admin = User::new("a", "Admin", Role::Admin);
        let lead = User::new("l", "Lead", Role::TeamLeader).with_team("Alpha");
        assert!(cal.day_detail(Some(&admin)).unwrap().can_quick_add);
        assert!(!cal.day_detail(Some(&lead)).unwrap().can_quick_add);
        assert!(!cal.day_detail(None).unwrap().can_quick_add);
    }

    #[test]
    fn replacing_the_snapshot_drops_old_tasks() {
        let mut cal = projector_at(date(2025, 3, 1));
        cal.replace_tasks(vec![Task::new("a", "x", "u1").with_deadline(date(2025, 3, 2))], cal.today());
        assert_eq!(cal.visible_buckets().total(), 1);
        cal.replace_tasks(vec![Task::new("b", "y", "u1").with_deadline(date(2025, 3, 3))], cal.today());
        assert_eq!(cal.visible_buckets().total(), 1);
        assert_eq!(cal.visible_buckets().day(2).unwrap().count(), 0);
        assert_eq!(cal.visible_buckets().day(3).unwrap().count(), 1);
    }

    #[test]
    fn refresh_after_midnight_moves_undated_tasks_and_the_today_marker() {
        let draft = Task::new("draft", "Caption ideas", "u1");
        let mut cal = projector_at(date(2025, 3, 14));
        cal.replace_tasks(vec![draft.clone()], date(2025, 3, 14));
        assert_eq!(cal.visible_buckets().day(14).unwrap().count(), 1);
        assert!(cal.visible_buckets().day(14).unwrap().is_today());

        cal.replace_tasks(vec![draft.clone()], date(2025, 3, 15));
        assert_eq!(cal.today(), date(2025, 3, 15));
        let buckets = cal.visible_buckets();
        assert_eq!(buckets.day(14).unwrap().count(), 0);
        assert!(!buckets.day(14).unwrap().is_today());
        assert_eq!(buckets.day(15).unwrap().count(), 1);
        assert!(buckets.day(15).unwrap().is_today());

        cal.open_day(date(2025, 3, 15));
        assert_eq!(cal.day_detail(None).unwrap().tasks, vec![draft]);
    }

    #[test]
    fn scoped_employee_month_shows_only_their_task() {
        let users = vec![
            User::new("u1", "Uma", Role::Employee),
            User::new("u2", "Ugo", Role::Employee),
        ];
        let tasks = vec![
            Task::new("1", "Script", "u1").with_deadline(date(2025, 3, 5)),
            Task::new("2", "Shoot", "u2").with_deadline(date(2025, 3, 5)),
        ];
        let scoped = AccessScope::new(Some(&users[0]), &users).scope_tasks(&tasks);
        assert_eq!(scoped.len(), 1);

        let mut cal = projector_at(date(2025, 3, 1));
        cal.replace_tasks(scoped, cal.today());
        let cell = cal.visible_buckets().day(5).unwrap();
        assert_eq!(cell.count(), 1);
        assert_eq!(cell.tasks()[0].id, "1");
    }

    #[test]
    fn commands_drive_the_state_machine() {
        let mut cal = projector_at(date(2024, 12, 1));
        let steps = [
            CalendarCommand::NextMonth,
            CalendarCommand::OpenDay { date: date(2025, 1, 31) },
            CalendarCommand::NextDay,
            CalendarCommand::Back,
        ];
        for command in steps {
            assert!(cal.apply(command.validate().unwrap()));
        }
        assert_eq!(cal.view(), CalendarView::Month { month: ym(2025, 2) });

        assert!(matches!(
            CalendarCommand::OpenMonth { year: 2025, month: 13 }.validate(),
            Err(BoardError::InvalidDateRange { .. })
        ));
        let open = CalendarCommand::OpenMonth { year: 2026, month: 7 }.validate().unwrap();
        assert!(cal.apply(open));
        assert_eq!(cal.view().month(), ym(2026, 7));

        let cmd: CalendarCommand = serde_json::from_str(r#"{"action":"open_day","date":"2025-02-14"}"#).unwrap();
        assert_eq!(cmd, CalendarCommand::OpenDay { date: date(2025, 2, 14) });
    }
}
