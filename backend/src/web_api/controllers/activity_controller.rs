use axum::{
    extract::{Path, Query, State},
    Extension,
};
use uuid::Uuid;

use crate::{
    activity_query::ActivityQuery,
    activity_view::ActivityView,
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, PROJECT_MEMBERS},
    error::{ApiError, ApiResult},
    role::Role,
    services::{activity_service::ActivityService, task_service::TaskService},
    task_activity_query::TaskActivityQuery,
};

pub struct ActivityController {}

impl ActivityController {
    pub async fn get_project_activity(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
        Query(query): Query<ActivityQuery>,
    ) -> ApiResult<ApiResponse<Vec<ActivityView>>> {
        require_role(&user, PROJECT_MEMBERS)?;
        let activity = ActivityService::new(&state.data_context).get_project_activity(project_id, &query)?;
        Ok(ApiResponse::ok("Project activity retrieved successfully", activity))
    }

    /// Developers only see their own trail; managers can look at anyone's.
    pub async fn get_user_activity(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(user_id): Path<Uuid>,
        Query(query): Query<ActivityQuery>,
    ) -> ApiResult<ApiResponse<Vec<ActivityView>>> {
        require_role(&user, PROJECT_MEMBERS)?;
        if user.is(Role::Developer) && user.user_id != user_id {
            return Err(ApiError::forbidden("You can only view your own activity"));
        }
        let activity = ActivityService::new(&state.data_context).get_user_activity(user_id, &query)?;
        Ok(ApiResponse::ok("User activity retrieved successfully", activity))
    }

    pub async fn get_task_activity(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(task_id): Path<Uuid>,
        Query(query): Query<TaskActivityQuery>,
    ) -> ApiResult<ApiResponse<Vec<ActivityView>>> {
        require_role(&user, PROJECT_MEMBERS)?;
        let tasks = TaskService::new(&state.data_context);
        let activity = ActivityService::new(&state.data_context).get_task_activity(task_id, query.project_id, &tasks)?;
        Ok(ApiResponse::ok("Task activity retrieved successfully", activity))
    }
}
