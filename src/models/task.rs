use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress", alias = "InProgress", alias = "in-progress")]
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Parses the slugs used by list filters (`pending`, `in-progress`, ...).
    pub fn from_filter(slug: &str) -> Option<Self> {
        match slug.trim().to_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" | "in_progress" | "inprogress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "cancelled" | "canceled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Cancelled => "Cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub project: Option<String>,
    /// Workflow category: Script, Shoot, Edit, Post, Ads, Meeting, ...
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "assigneeId")]
    pub assignee_id: String,
    #[serde(default, alias = "assignedDate", deserialize_with = "lenient_date")]
    pub assigned_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, alias = "createdBy")]
    pub created_by: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, assignee_id: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            project: None,
            stage: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            client_id: None,
            assignee_id: assignee_id.into(),
            assigned_date: None,
            deadline: None,
            created_by: None,
            created_at: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_client(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.stage = stage.to_string();
        self
    }
}

/// Accepts `YYYY-MM-DD`, a full RFC 3339 timestamp, or anything else.
/// Values that do not parse become `None` so the calendar's fallback chain
/// decides where the task lands instead of the whole record failing to load.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub project: Option<String>,
    #[serde(default)]
    pub stage: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub client_id: Option<String>,
    /// Defaults to the creator.
    pub assignee_id: Option<String>,
    pub assigned_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub project: Option<String>,
    pub stage: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub client_id: Option<String>,
    pub assignee_id: Option<String>,
    pub assigned_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.project.is_none()
            && self.stage.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.client_id.is_none()
            && self.assignee_id.is_none()
            && self.assigned_date.is_none()
            && self.deadline.is_none()
    }

    /// True when only the progress fields (`status`, `stage`) are set.
    pub fn touches_only_progress(&self) -> bool {
        self.title.is_none()
            && self.project.is_none()
            && self.priority.is_none()
            && self.client_id.is_none()
            && self.assignee_id.is_none()
            && self.assigned_date.is_none()
            && self.deadline.is_none()
    }

    /// The new assignee, if this update actually changes it.
    pub fn reassigns<'a>(&'a self, task: &Task) -> Option<&'a str> {
        self.assignee_id
            .as_deref()
            .filter(|assignee| *assignee != task.assignee_id)
    }

    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(project) = self.project {
            task.project = Some(project);
        }
        if let Some(stage) = self.stage {
            task.stage = stage;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(client_id) = self.client_id {
            task.client_id = Some(client_id).filter(|id| !id.is_empty());
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(assigned_date) = self.assigned_date {
            task.assigned_date = Some(assigned_date);
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_camel_case_records_load() {
        let raw = r#"{
            "id": "1700000000000",
            "title": "Cut teaser",
            "stage": "Edit",
            "status": "In Progress",
            "clientId": "c1",
            "assigneeId": "u1",
            "assignedDate": "2025-03-01",
            "deadline": "2025-03-05T10:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.client_id.as_deref(), Some("c1"));
        assert_eq!(task.assigned_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn unparseable_deadline_becomes_none() {
        let raw = r#"{"id":"t","title":"x","assignee_id":"u1","deadline":"next week"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.deadline, None);
    }

    #[test]
    fn progress_only_updates_are_detected() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Done),
            stage: Some("Post".into()),
            ..TaskUpdate::default()
        };
        assert!(update.touches_only_progress());

        let update = TaskUpdate {
            status: Some(TaskStatus::Done),
            deadline: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..TaskUpdate::default()
        };
        assert!(!update.touches_only_progress());
    }

    #[test]
    fn reassigning_to_the_same_person_is_not_a_reassignment() {
        let task = Task::new("t1", "Shoot", "u1");
        let same = TaskUpdate { assignee_id: Some("u1".into()), ..TaskUpdate::default() };
        let other = TaskUpdate { assignee_id: Some("u2".into()), ..TaskUpdate::default() };
        assert_eq!(same.reassigns(&task), None);
        assert_eq!(other.reassigns(&task), Some("u2"));
    }

    #[test]
    fn status_filters() {
        assert_eq!(TaskStatus::from_filter("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_filter("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::from_filter("all"), None);
    }
}
