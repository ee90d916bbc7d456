use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{NotificationId, ProjectId, TaskId};
use super::task::Priority;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    TaskDue,
    TaskCompleted,
    TaskAssigned,
    Project,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::TaskDue,
        NotificationKind::TaskCompleted,
        NotificationKind::TaskAssigned,
        NotificationKind::Project,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::TaskDue => "task-due",
            NotificationKind::TaskCompleted => "task-completed",
            NotificationKind::TaskAssigned => "task-assigned",
            NotificationKind::Project => "project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s.trim())
    }
}

/// One entry of the notification bell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

/// A notification before the store has given it an id and a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub message: String,
    pub task_id: Option<TaskId>,
    pub project_id: Option<ProjectId>,
    pub priority: Priority,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        NewNotification {
            kind,
            message: message.into(),
            task_id: None,
            project_id: None,
            priority: Priority::Medium,
        }
    }

    pub fn into_notification(self, id: NotificationId, at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            kind: self.kind,
            message: self.message,
            task_id: self.task_id,
            project_id: self.project_id,
            priority: self.priority,
            read: false,
            timestamp: at,
        }
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// "3 days ago", "1 hour ago", "Just now"
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_days() > 0 {
        plural(elapsed.num_days(), "day")
    } else if elapsed.num_hours() > 0 {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed.num_minutes() > 0 {
        plural(elapsed.num_minutes(), "minute")
    } else {
        "Just now".to_string()
    }
}
