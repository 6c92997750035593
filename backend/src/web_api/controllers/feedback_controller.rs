use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse, app_state::SharedState, authentication::auth::AuthUser,
    create_feedback_request::CreateFeedbackRequest, error::ApiResult, feedback::Feedback,
    feedback_view::FeedbackView, services::feedback_service::FeedbackService,
};

pub struct FeedbackController {}

impl FeedbackController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreateFeedbackRequest>,
    ) -> ApiResult<ApiResponse<Feedback>> {
        let feedback = FeedbackService::new(&state.data_context).create_feedback(body, &user)?;
        Ok(ApiResponse::created("Feedback created successfully", feedback))
    }

    pub async fn get_by_project(
        State(state): State<SharedState>,
        Path(project_id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<Vec<FeedbackView>>> {
        let feedbacks = FeedbackService::new(&state.data_context).list_by_project(project_id)?;
        Ok(ApiResponse::ok("Feedbacks retrieved successfully", feedbacks))
    }
}
