use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, project_controller::ProjectController};

pub const ROUTER_PATH: &str = "/projects";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(ProjectController::get_all).post(ProjectController::create))
        .route(format!("{}/dashboard-stats", ROUTER_PATH).as_str(), get(ProjectController::dashboard_stats))
        .route(
            format!("{}/:id", ROUTER_PATH).as_str(),
            get(ProjectController::get).patch(ProjectController::update),
        )
        .route(format!("{}/:id/team", ROUTER_PATH).as_str(), post(ProjectController::add_team_member))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
