use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    add_comment_request::AddCommentRequest,
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, EVERYONE, MANAGERS},
    create_task_request::CreateTaskRequest,
    error::ApiResult,
    log_time_request::LogTimeRequest,
    services::task_service::TaskService,
    task::{Comment, Task},
    task_detail_response::TaskDetailResponse,
    task_list_query::TaskListQuery,
    update_task_request::UpdateTaskRequest,
};

pub struct TaskController {}

impl TaskController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreateTaskRequest>,
    ) -> ApiResult<ApiResponse<Task>> {
        require_role(&user, MANAGERS)?;
        let task = TaskService::new(&state.data_context).create_task(body, &user)?;
        Ok(ApiResponse::created("Task created successfully", task))
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Query(query): Query<TaskListQuery>,
    ) -> ApiResult<ApiResponse<Vec<Task>>> {
        require_role(&user, EVERYONE)?;
        let tasks = TaskService::new(&state.data_context).get_all_tasks(&query)?;
        Ok(ApiResponse::ok("Tasks retrieved successfully", tasks))
    }

    pub async fn get(
        State(state): State<SharedState>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<TaskDetailResponse>> {
        let task = TaskService::new(&state.data_context).get_task_by_id(id)?;
        Ok(ApiResponse::ok("Task retrieved successfully", task))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateTaskRequest>,
    ) -> ApiResult<ApiResponse<Task>> {
        let task = TaskService::new(&state.data_context).update_task(id, body, &user)?;
        Ok(ApiResponse::ok("Task updated successfully", task))
    }

    pub async fn log_time(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<LogTimeRequest>,
    ) -> ApiResult<ApiResponse<Task>> {
        let task = TaskService::new(&state.data_context).log_time(id, &user, body)?;
        Ok(ApiResponse::ok("Time logged successfully", task))
    }

    pub async fn add_comment(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<AddCommentRequest>,
    ) -> ApiResult<ApiResponse<Comment>> {
        let comment = TaskService::new(&state.data_context).add_comment(id, &user, body)?;
        Ok(ApiResponse::created("Comment added successfully", comment))
    }
}
