use serde::Serialize;

use crate::{project::Project, task::Task};

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}
