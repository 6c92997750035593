use axum::{
    extract::{Path, Query, State},
    Extension,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::AuthUser,
    error::ApiResult,
    notification::Notification,
    notification_page::{MarkAllReadResponse, NotificationPage, UnreadCountResponse},
    notification_query::NotificationQuery,
    services::notification_service::NotificationService,
};

pub struct NotificationController {}

impl NotificationController {
    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Query(query): Query<NotificationQuery>,
    ) -> ApiResult<ApiResponse<NotificationPage>> {
        let page = NotificationService::new(&state.data_context).get_user_notifications(user.user_id, query)?;
        Ok(ApiResponse::ok("Notifications retrieved successfully", page))
    }

    pub async fn unread_count(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<UnreadCountResponse>> {
        let count = NotificationService::new(&state.data_context).get_unread_count(user.user_id)?;
        Ok(ApiResponse::ok("Unread count retrieved successfully", UnreadCountResponse { count }))
    }

    pub async fn mark_as_read(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<Notification>> {
        let notification = NotificationService::new(&state.data_context).mark_as_read(id, user.user_id)?;
        Ok(ApiResponse::ok("Notification marked as read", notification))
    }

    pub async fn mark_all_as_read(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<MarkAllReadResponse>> {
        let modified = NotificationService::new(&state.data_context).mark_all_as_read(user.user_id)?;
        Ok(ApiResponse::ok("All notifications marked as read", MarkAllReadResponse { modified }))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<()>> {
        NotificationService::new(&state.data_context).delete_notification(id, user.user_id)?;
        Ok(ApiResponse::message("Notification deleted successfully"))
    }
}
