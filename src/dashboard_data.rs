// src/dashboard_data.rs

use std::collections::{BTreeMap, BTreeSet};

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::app_state::{AppState, Session};
use crate::calendar::epoch_id_date;
use crate::error::BoardError;
use crate::models::{Client, Task, TaskStatus};

const MONTH_LABELS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
const DAILY_WINDOW: u64 = 7;
const YEARLY_WINDOW: i32 = 5;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTotals {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub cancelled: usize,
}

/// Headline numbers for the dashboard, computed over what the actor can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total_clients: usize,
    pub active_projects: usize,
    pub due_today: usize,
    pub overdue: usize,
    pub total_tasks: usize,
    pub by_status: StatusTotals,
    /// Task count per workflow stage. Tasks without a stage are left out.
    pub by_stage: BTreeMap<String, usize>,
}

/// `tasks` and `clients` must already be scoped to the actor.
pub fn compute_stats(tasks: &[Task], clients: &[Client], today: NaiveDate) -> TaskStats {
    let mut by_status = StatusTotals::default();
    let mut by_stage = BTreeMap::new();
    let mut projects = BTreeSet::new();
    let mut due_today = 0;
    let mut overdue = 0;

    for task in tasks {
        match task.status {
            TaskStatus::Pending => by_status.pending += 1,
            TaskStatus::InProgress => by_status.in_progress += 1,
            TaskStatus::Done => by_status.done += 1,
            TaskStatus::Cancelled => by_status.cancelled += 1,
        }
        if !task.stage.trim().is_empty() {
            *by_stage.entry(task.stage.clone()).or_insert(0) += 1;
        }
        if task.status != TaskStatus::Done {
            if let Some(project) = task.project.as_deref().filter(|p| !p.trim().is_empty()) {
                projects.insert(project);
            }
        }
        match task.deadline {
            Some(deadline) if deadline == today => due_today += 1,
            Some(deadline) if deadline < today && !task.status.is_closed() => overdue += 1,
            _ => {}
        }
    }

    TaskStats {
        total_clients: clients.len(),
        active_projects: projects.len(),
        due_today,
        overdue,
        total_tasks: tasks.len(),
        by_status,
        by_stage,
    }
}

/// GET /stats
pub async fn get_stats(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let scope = session.scope();
    let tasks = scope.scope_tasks(&session.snapshot.tasks);
    let clients = scope.scope_clients(&session.snapshot.clients, &session.snapshot.tasks);
    let stats = compute_stats(&tasks, &clients, Local::now().date_naive());
    Ok(HttpResponse::Ok().json(stats))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelinePeriod {
    /// The last seven days, today included.
    #[default]
    Daily,
    /// January through December of the current year.
    Monthly,
    /// The last five years, the current one included.
    Yearly,
}

impl TimelinePeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "daily" => Some(TimelinePeriod::Daily),
            "monthly" => Some(TimelinePeriod::Monthly),
            "yearly" => Some(TimelinePeriod::Yearly),
            _ => None,
        }
    }
}

/// Chart series: `data[i]` is the task count for `labels[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub period: Option<String>,
}

/// When a task entered the board: its creation stamp, else the date in a
/// millisecond id, else `today`.
pub fn timeline_date(task: &Task, today: NaiveDate) -> NaiveDate {
    task.created_at
        .map(|at| at.date_naive())
        .or_else(|| epoch_id_date(&task.id))
        .unwrap_or(today)
}

/// Creation counts per slot of `period`. Tasks outside the window are ignored.
pub fn compute_timeline(tasks: &[Task], period: TimelinePeriod, today: NaiveDate) -> Timeline {
    let dates: Vec<NaiveDate> = tasks.iter().map(|t| timeline_date(t, today)).collect();

    match period {
        TimelinePeriod::Daily => {
            let days: Vec<NaiveDate> = (0..DAILY_WINDOW)
                .rev()
                .filter_map(|back| today.checked_sub_days(Days::new(back)))
                .collect();
            Timeline {
                labels: days.iter().map(|d| d.format("%b %-d").to_string()).collect(),
                data: days.iter().map(|day| tally(&dates, |d| d == *day)).collect(),
            }
        }
        TimelinePeriod::Monthly => Timeline {
            labels: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
            data: (1..=12u32)
                .map(|month| tally(&dates, |d| d.year() == today.year() && d.month() == month))
                .collect(),
        },
        TimelinePeriod::Yearly => {
            let years: Vec<i32> = (0..YEARLY_WINDOW).rev().map(|back| today.year() - back).collect();
            Timeline {
                labels: years.iter().map(|y| y.to_string()).collect(),
                data: years.iter().map(|year| tally(&dates, |d| d.year() == *year)).collect(),
            }
        }
    }
}

fn tally(dates: &[NaiveDate], hit: impl Fn(NaiveDate) -> bool) -> usize {
    dates.iter().filter(|d| hit(**d)).count()
}

/// GET /stats/timeline?period=daily|monthly|yearly
pub async fn get_timeline(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<TimelineQuery>,
) -> Result<HttpResponse, BoardError> {
    let period = match query.period.as_deref() {
        None | Some("") => TimelinePeriod::default(),
        Some(raw) => TimelinePeriod::parse(raw)
            .ok_or_else(|| BoardError::BadRequest(format!("unknown timeline period {raw}")))?,
    };
    let session = Session::load(&data, &req).await;
    let tasks = session.scope().scope_tasks(&session.snapshot.tasks);
    let timeline = compute_timeline(&tasks, period, Local::now().date_naive());
    Ok(HttpResponse::Ok().json(timeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stats_count_what_they_are_given() {
        let today = date(2025, 3, 10);
        let mut script = Task::new("t1", "Script", "u1").with_stage("Script").with_deadline(today);
        script.project = Some("Spring launch".into());
        let mut shoot = Task::new("t2", "Shoot", "u1")
            .with_stage("Shoot")
            .with_deadline(date(2025, 3, 1))
            .with_status(TaskStatus::InProgress);
        shoot.project = Some("Spring launch".into());
        let mut wrap = Task::new("t3", "Wrap", "u1")
            .with_stage("Shoot")
            .with_deadline(date(2025, 2, 1))
            .with_status(TaskStatus::Done);
        wrap.project = Some("Winter promo".into());
        let dropped = Task::new("t4", "Dropped", "u1")
            .with_deadline(date(2025, 1, 1))
            .with_status(TaskStatus::Cancelled);

        let stats = compute_stats(&[script, shoot, wrap, dropped], &[Client::new("c1", "Acme")], today);

        assert_eq!(
            stats,
            TaskStats {
                total_clients: 1,
                active_projects: 1,
                due_today: 1,
                overdue: 1,
                total_tasks: 4,
                by_status: StatusTotals { pending: 1, in_progress: 1, done: 1, cancelled: 1 },
                by_stage: BTreeMap::from([("Script".to_string(), 1), ("Shoot".to_string(), 2)]),
            }
        );
    }

    fn created(id: &str, y: i32, m: u32, d: u32) -> Task {
        let mut task = Task::new(id, "x", "u1");
        task.created_at = date(y, m, d).and_hms_opt(10, 0, 0).map(|dt| dt.and_utc());
        task
    }

    #[test]
    fn timeline_date_prefers_stamp_then_id_then_today() {
        let today = date(2025, 3, 10);
        // 2025-03-20T12:00:00Z
        let mut stamped = created("1742472000000", 2025, 3, 2);
        assert_eq!(timeline_date(&stamped, today), date(2025, 3, 2));
        stamped.created_at = None;
        assert_eq!(timeline_date(&stamped, today), date(2025, 3, 20));
        assert_eq!(timeline_date(&Task::new("t-9", "x", "u1"), today), today);
    }

    #[test]
    fn daily_covers_the_last_seven_days() {
        let today = date(2025, 3, 3);
        let tasks = vec![
            created("a", 2025, 2, 25),
            created("b", 2025, 3, 3),
            created("c", 2025, 2, 24),
            Task::new("undated", "x", "u1"),
        ];
        let timeline = compute_timeline(&tasks, TimelinePeriod::Daily, today);
        assert_eq!(
            timeline.labels,
            vec!["Feb 25", "Feb 26", "Feb 27", "Feb 28", "Mar 1", "Mar 2", "Mar 3"]
        );
        assert_eq!(timeline.data, vec![1, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn monthly_counts_only_the_current_year() {
        let today = date(2025, 6, 1);
        let tasks = vec![created("a", 2025, 1, 5), created("b", 2025, 1, 30), created("c", 2024, 1, 5)];
        let timeline = compute_timeline(&tasks, TimelinePeriod::Monthly, today);
        assert_eq!(timeline.labels.len(), 12);
        assert_eq!(timeline.labels[0], "Jan");
        assert_eq!(timeline.data, vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn yearly_covers_five_years_ending_now() {
        let today = date(2025, 3, 10);
        let tasks = vec![created("a", 2021, 7, 1), created("b", 2020, 12, 31), created("c", 2025, 1, 1)];
        let timeline = compute_timeline(&tasks, TimelinePeriod::Yearly, today);
        assert_eq!(timeline.labels, vec!["2021", "2022", "2023", "2024", "2025"]);
        assert_eq!(timeline.data, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn empty_boards_still_get_a_full_zero_series() {
        let timeline = compute_timeline(&[], TimelinePeriod::Monthly, date(2025, 3, 10));
        assert_eq!(timeline.data, vec![0; 12]);
        assert_eq!(TimelinePeriod::parse(" Yearly "), Some(TimelinePeriod::Yearly));
        assert_eq!(TimelinePeriod::parse("weekly"), None);
    }
}
