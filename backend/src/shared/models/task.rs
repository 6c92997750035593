use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{task_priority::TaskPriority, task_status::TaskStatus};

/// One timer interval. Open while `end_time` is None.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds; set when the interval closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl TimeLog {
    pub fn closed(user_id: Uuid, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            user_id,
            start_time,
            end_time: Some(end_time),
            duration: Some((end_time - start_time).num_seconds()),
        }
    }

    pub fn open(user_id: Uuid, start_time: DateTime<Utc>) -> Self {
        Self {
            user_id,
            start_time,
            end_time: None,
            duration: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn close(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
        self.duration = Some((end_time - self.start_time).num_seconds());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_private: bool,
}

/// Upload metadata; the bytes live in file storage under the task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: DateTime<Utc>,
    /// Hours.
    pub estimated_time: f64,
    pub status: TaskStatus,
    /// Seconds, always the sum of closed time-log durations.
    #[serde(default)]
    pub time_logged: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub time_logs: Vec<TimeLog>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn recompute_time_logged(&mut self) {
        self.time_logged = self.time_logs.iter().filter_map(|log| log.duration).sum();
    }

    pub fn open_log_index(&self, user_id: Uuid) -> Option<usize> {
        self.time_logs
            .iter()
            .position(|log| log.user_id == user_id && log.is_open())
    }

    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assignee_id == Some(user_id)
    }

    /// Stamps start/completion dates for a status move.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::InProgress && self.start_date.is_none() {
            self.start_date = Some(now);
        }
        if status == TaskStatus::Completed {
            if self.start_date.is_none() {
                self.start_date = Some(now);
            }
            self.completed_date = Some(now);
        } else {
            self.completed_date = None;
        }
        self.status = status;
    }
}
