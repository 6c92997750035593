use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{task_priority::TaskPriority, task_status::TaskStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: DateTime<Utc>,
    pub estimated_time: f64,
    #[serde(default)]
    pub status: TaskStatus,
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}
