use std::sync::Arc;
use axum::{Router, middleware, routing::{delete, get, patch}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, notification_controller::NotificationController};

pub const ROUTER_PATH: &str = "/notifications";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(NotificationController::get_all))
        .route(format!("{}/unread-count", ROUTER_PATH).as_str(), get(NotificationController::unread_count))
        .route(format!("{}/mark-all-read", ROUTER_PATH).as_str(), patch(NotificationController::mark_all_as_read))
        .route(format!("{}/:id/read", ROUTER_PATH).as_str(), patch(NotificationController::mark_as_read))
        .route(format!("{}/:id", ROUTER_PATH).as_str(), delete(NotificationController::delete))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
