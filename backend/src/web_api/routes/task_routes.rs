use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, task_controller::TaskController};

pub const ROUTER_PATH: &str = "/tasks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(TaskController::get_all).post(TaskController::create))
        .route(
            format!("{}/:id", ROUTER_PATH).as_str(),
            get(TaskController::get).patch(TaskController::update),
        )
        .route(format!("{}/:id/log-time", ROUTER_PATH).as_str(), post(TaskController::log_time))
        .route(format!("{}/:id/comments", ROUTER_PATH).as_str(), post(TaskController::add_comment))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
