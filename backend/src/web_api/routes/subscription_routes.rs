use std::sync::Arc;
use axum::{Router, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, subscription_controller::SubscriptionController};

pub const ROUTER_PATH: &str = "/subscriptions";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route(format!("{}/price", ROUTER_PATH).as_str(), get(SubscriptionController::price))
        .with_state(app_state.clone());

    Router::new()
        .route(format!("{}/create-checkout", ROUTER_PATH).as_str(), post(SubscriptionController::create_checkout))
        .route(format!("{}/verify-payment", ROUTER_PATH).as_str(), post(SubscriptionController::verify_payment))
        .route(format!("{}/status", ROUTER_PATH).as_str(), get(SubscriptionController::status))
        .route(format!("{}/all", ROUTER_PATH).as_str(), get(SubscriptionController::get_all))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
        .merge(public)
}
