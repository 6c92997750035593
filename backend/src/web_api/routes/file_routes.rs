use std::sync::Arc;
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::{get, post}};
use crate::{app_state::AppState, authentication::auth::auth_middleware, file_controller::FileController};

pub const ROUTER_PATH: &str = "/files";

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/upload/:task_id", ROUTER_PATH).as_str(), post(FileController::upload))
        .route(
            format!("{}/:file_id", ROUTER_PATH).as_str(),
            get(FileController::download).delete(FileController::delete),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .with_state(app_state)
}
