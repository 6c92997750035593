use std::sync::Arc;
use axum::{Router, routing::post};
use crate::{app_state::AppState, authentication_controller::AuthenticationController};

pub const ROUTER_PATH: &str = "/auth";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/signup", ROUTER_PATH).as_str(), post(AuthenticationController::signup))
        .route(format!("{}/login", ROUTER_PATH).as_str(), post(AuthenticationController::login))
        .route(format!("{}/refresh-token", ROUTER_PATH).as_str(), post(AuthenticationController::refresh_token))
        .route(format!("{}/logout", ROUTER_PATH).as_str(), post(AuthenticationController::logout))
        .with_state(app_state)
}
