use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    add_team_member_request::AddTeamMemberRequest,
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, EVERYONE, MANAGERS},
    create_project_request::CreateProjectRequest,
    dashboard_stats_response::DashboardStatsResponse,
    error::ApiResult,
    project::Project,
    project_detail_response::ProjectDetailResponse,
    services::project_service::ProjectService,
    update_project_request::UpdateProjectRequest,
};

pub struct ProjectController {}

impl ProjectController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreateProjectRequest>,
    ) -> ApiResult<ApiResponse<Project>> {
        require_role(&user, MANAGERS)?;
        let project = ProjectService::new(&state.data_context).create_project(body, &user)?;
        Ok(ApiResponse::created("Project created successfully", project))
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<Vec<Project>>> {
        require_role(&user, EVERYONE)?;
        let projects = ProjectService::new(&state.data_context).get_all_projects(&user)?;
        Ok(ApiResponse::ok("Projects retrieved successfully", projects))
    }

    pub async fn dashboard_stats(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<DashboardStatsResponse>> {
        let stats = ProjectService::new(&state.data_context).get_dashboard_stats(&user)?;
        Ok(ApiResponse::ok("Dashboard stats retrieved successfully", stats))
    }

    pub async fn get(
        State(state): State<SharedState>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<ProjectDetailResponse>> {
        let project = ProjectService::new(&state.data_context).get_project_by_id(id)?;
        Ok(ApiResponse::ok("Project retrieved successfully", project))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateProjectRequest>,
    ) -> ApiResult<ApiResponse<Project>> {
        require_role(&user, MANAGERS)?;
        let project = ProjectService::new(&state.data_context).update_project(id, body, &user)?;
        Ok(ApiResponse::ok("Project updated successfully", project))
    }

    pub async fn add_team_member(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<AddTeamMemberRequest>,
    ) -> ApiResult<ApiResponse<Project>> {
        require_role(&user, MANAGERS)?;
        let project = ProjectService::new(&state.data_context).add_team_member(id, body.user_id, &user)?;
        Ok(ApiResponse::ok("Team member added successfully", project))
    }
}
