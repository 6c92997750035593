use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, rating_controller::RatingController};

pub const ROUTER_PATH: &str = "/ratings";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route(format!("{}/user/:user_id", ROUTER_PATH).as_str(), get(RatingController::get_user_ratings))
        .route(format!("{}/user/:user_id/average", ROUTER_PATH).as_str(), get(RatingController::get_average))
        .route(format!("{}/user/:user_id/breakdown", ROUTER_PATH).as_str(), get(RatingController::get_breakdown))
        .with_state(app_state.clone());

    Router::new()
        .route(ROUTER_PATH, post(RatingController::create))
        .route(format!("{}/given", ROUTER_PATH).as_str(), get(RatingController::get_given))
        .route(format!("{}/received", ROUTER_PATH).as_str(), get(RatingController::get_received))
        .route(format!("{}/check/:entity_type/:entity_id", ROUTER_PATH).as_str(), get(RatingController::check))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
        .merge(public)
}
