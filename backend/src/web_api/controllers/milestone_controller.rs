use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, MANAGERS},
    create_milestone_request::CreateMilestoneRequest,
    error::ApiResult,
    project::Milestone,
    services::project_service::ProjectService,
    update_milestone_request::UpdateMilestoneRequest,
};

pub struct MilestoneController {}

impl MilestoneController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
        Json(body): Json<CreateMilestoneRequest>,
    ) -> ApiResult<ApiResponse<Milestone>> {
        require_role(&user, MANAGERS)?;
        let milestone = ProjectService::new(&state.data_context).add_milestone(project_id, body, &user)?;
        Ok(ApiResponse::created("Milestone created successfully", milestone))
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Path(project_id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<Vec<Milestone>>> {
        let milestones = ProjectService::new(&state.data_context).list_milestones(project_id)?;
        Ok(ApiResponse::ok("Milestones retrieved successfully", milestones))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path((project_id, milestone_id)): Path<(Uuid, Uuid)>,
        Json(body): Json<UpdateMilestoneRequest>,
    ) -> ApiResult<ApiResponse<Milestone>> {
        require_role(&user, MANAGERS)?;
        let milestone =
            ProjectService::new(&state.data_context).update_milestone(project_id, milestone_id, body, &user)?;
        Ok(ApiResponse::ok("Milestone updated successfully", milestone))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path((project_id, milestone_id)): Path<(Uuid, Uuid)>,
    ) -> ApiResult<ApiResponse<()>> {
        require_role(&user, MANAGERS)?;
        ProjectService::new(&state.data_context).delete_milestone(project_id, milestone_id, &user)?;
        Ok(ApiResponse::message("Milestone deleted successfully"))
    }
}
