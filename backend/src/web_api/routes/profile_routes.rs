use std::sync::Arc;
use axum::{Router, middleware, routing::get};
use crate::{app_state::AppState, authentication::auth::auth_middleware, profile_controller::ProfileController};

pub const ROUTER_PATH: &str = "/profile";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route(format!("{}/search", ROUTER_PATH).as_str(), get(ProfileController::search))
        .route(format!("{}/:id", ROUTER_PATH).as_str(), get(ProfileController::get_public))
        .with_state(app_state.clone());

    Router::new()
        .route(
            ROUTER_PATH,
            get(ProfileController::get_mine)
                .post(ProfileController::create)
                .patch(ProfileController::update),
        )
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
        .merge(public)
}
