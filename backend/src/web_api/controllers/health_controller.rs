use axum::extract::State;
use serde::Serialize;

use crate::{api_response::ApiResponse, app_state::SharedState, error::ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub users: u64,
}

pub struct HealthController {}

impl HealthController {
    /// Touches the store so a broken database shows up as a 500.
    pub async fn get(State(state): State<SharedState>) -> ApiResult<ApiResponse<HealthStatus>> {
        let users = state.data_context.count_users()?;
        Ok(ApiResponse::ok("Server is healthy", HealthStatus { status: "ok", users }))
    }
}
