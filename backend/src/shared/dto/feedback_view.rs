use serde::Serialize;

use crate::feedback::Feedback;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub reviewer_name: String,
    pub reviewee_name: String,
}
