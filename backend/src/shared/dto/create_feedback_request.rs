use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub reviewee_id: Uuid,
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub rating: u8,
    pub comment: Option<String>,
}
