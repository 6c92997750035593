use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, SUPER_ADMIN},
    error::ApiResult,
    platform_analytics_response::PlatformAnalyticsResponse,
    services::user_service::UserService,
    update_role_request::UpdateRoleRequest,
    user_get_response::UserGetResponse,
};

pub struct UserController {}

impl UserController {
    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<Vec<UserGetResponse>>> {
        require_role(&user, SUPER_ADMIN)?;
        let users = UserService::new(&state.data_context).list_users()?;
        Ok(ApiResponse::ok("Users retrieved successfully", users))
    }

    pub async fn get(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let found = UserService::new(&state.data_context).get_user(id)?;
        Ok(ApiResponse::ok("User retrieved successfully", found))
    }

    pub async fn analytics(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<PlatformAnalyticsResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let analytics = UserService::new(&state.data_context).platform_analytics()?;
        Ok(ApiResponse::ok("Platform analytics retrieved successfully", analytics))
    }

    pub async fn update_role(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateRoleRequest>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let updated = UserService::new(&state.data_context).update_role(user.user_id, id, body.role)?;
        Ok(ApiResponse::ok("User role updated successfully", updated))
    }

    pub async fn suspend(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let updated = UserService::new(&state.data_context).set_active(user.user_id, id, false)?;
        Ok(ApiResponse::ok("User suspended successfully", updated))
    }

    pub async fn activate(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let updated = UserService::new(&state.data_context).set_active(user.user_id, id, true)?;
        Ok(ApiResponse::ok("User activated successfully", updated))
    }

    pub async fn block(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let updated = UserService::new(&state.data_context).set_blocked(user.user_id, id, true)?;
        Ok(ApiResponse::ok("User blocked successfully", updated))
    }

    pub async fn unblock(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        require_role(&user, SUPER_ADMIN)?;
        let updated = UserService::new(&state.data_context).set_blocked(user.user_id, id, false)?;
        Ok(ApiResponse::ok("User unblocked successfully", updated))
    }
}
