use std::sync::Arc;
use axum::{Router, middleware, routing::get};
use crate::{app_state::AppState, authentication::auth::auth_middleware, activity_controller::ActivityController};

pub const ROUTER_PATH: &str = "/activity";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/project/:project_id", ROUTER_PATH).as_str(), get(ActivityController::get_project_activity))
        .route(format!("{}/user/:user_id", ROUTER_PATH).as_str(), get(ActivityController::get_user_activity))
        .route(format!("{}/task/:task_id", ROUTER_PATH).as_str(), get(ActivityController::get_task_activity))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
