use serde::Serialize;
use uuid::Uuid;

use crate::{task::Task, task_status::TaskStatus};

#[derive(Debug, Clone, Serialize)]
pub struct DependencySummary {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailResponse {
    #[serde(flatten)]
    pub task: Task,
    pub dependency_details: Vec<DependencySummary>,
}
