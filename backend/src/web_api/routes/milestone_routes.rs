use std::sync::Arc;
use axum::{Router, middleware, routing::{get, patch}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, milestone_controller::MilestoneController};

pub const ROUTER_PATH: &str = "/milestones";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            format!("{}/:project_id", ROUTER_PATH).as_str(),
            get(MilestoneController::get_all).post(MilestoneController::create),
        )
        .route(
            format!("{}/:project_id/:milestone_id", ROUTER_PATH).as_str(),
            patch(MilestoneController::update).delete(MilestoneController::delete),
        )
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
