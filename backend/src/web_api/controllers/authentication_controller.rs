use axum::{extract::State, Json};

use crate::{
    api_response::ApiResponse, app_state::SharedState, error::ApiResult, login_request::LoginRequest,
    login_response::LoginResponse, refresh_token_request::RefreshTokenRequest,
    services::auth_service::AuthService, signup_request::SignupRequest, token_response::TokenResponse,
    user_get_response::UserGetResponse,
};

pub struct AuthenticationController {}

impl AuthenticationController {
    pub async fn signup(
        State(state): State<SharedState>,
        Json(payload): Json<SignupRequest>,
    ) -> ApiResult<ApiResponse<UserGetResponse>> {
        let user = AuthService::new(&state.data_context, &state.settings).signup(payload)?;
        Ok(ApiResponse::created("User created successfully", user))
    }

    pub async fn login(
        State(state): State<SharedState>,
        Json(payload): Json<LoginRequest>,
    ) -> ApiResult<ApiResponse<LoginResponse>> {
        let login = AuthService::new(&state.data_context, &state.settings).login(payload)?;
        Ok(ApiResponse::ok("User logged in successfully", login))
    }

    pub async fn refresh_token(
        State(state): State<SharedState>,
        Json(payload): Json<RefreshTokenRequest>,
    ) -> ApiResult<ApiResponse<TokenResponse>> {
        let token = AuthService::new(&state.data_context, &state.settings).refresh_token(&payload.refresh_token)?;
        Ok(ApiResponse::ok("Token refreshed successfully", token))
    }

    /// Tokens are stateless; the client drops them.
    pub async fn logout() -> ApiResponse<()> {
        ApiResponse::message("Logged out successfully")
    }
}
