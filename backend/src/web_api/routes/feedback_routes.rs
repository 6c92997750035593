use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, feedback_controller::FeedbackController};

pub const ROUTER_PATH: &str = "/feedbacks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, post(FeedbackController::create))
        .route(format!("{}/:project_id", ROUTER_PATH).as_str(), get(FeedbackController::get_by_project))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
