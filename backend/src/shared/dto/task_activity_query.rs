use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivityQuery {
    pub project_id: Option<Uuid>,
}
