use std::sync::Arc;
use axum::{Router, middleware, routing::{get, patch}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, user_controller::UserController};

pub const ROUTER_PATH: &str = "/users";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(UserController::get_all))
        .route(format!("{}/analytics", ROUTER_PATH).as_str(), get(UserController::analytics))
        .route(format!("{}/:id", ROUTER_PATH).as_str(), get(UserController::get))
        .route(format!("{}/:id/role", ROUTER_PATH).as_str(), patch(UserController::update_role))
        .route(format!("{}/:id/suspend", ROUTER_PATH).as_str(), patch(UserController::suspend))
        .route(format!("{}/:id/activate", ROUTER_PATH).as_str(), patch(UserController::activate))
        .route(format!("{}/:id/block", ROUTER_PATH).as_str(), patch(UserController::block))
        .route(format!("{}/:id/unblock", ROUTER_PATH).as_str(), patch(UserController::unblock))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
