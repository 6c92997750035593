use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse, app_state::SharedState, authentication::auth::AuthUser,
    create_profile_request::CreateProfileRequest, error::ApiResult, profile::Profile,
    profile_search_query::ProfileSearchQuery, services::profile_service::ProfileService,
    update_profile_request::UpdateProfileRequest,
};

pub struct ProfileController {}

impl ProfileController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreateProfileRequest>,
    ) -> ApiResult<ApiResponse<Profile>> {
        let profile = ProfileService::new(&state.data_context).create_profile(user.user_id, body)?;
        Ok(ApiResponse::created("Profile created successfully", profile))
    }

    pub async fn get_mine(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<Profile>> {
        let profile = ProfileService::new(&state.data_context).get_my_profile(user.user_id)?;
        Ok(ApiResponse::ok("Profile retrieved successfully", profile))
    }

    pub async fn get_public(
        State(state): State<SharedState>,
        Path(id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<Profile>> {
        let profile = ProfileService::new(&state.data_context).get_public_profile(id)?;
        Ok(ApiResponse::ok("Profile retrieved successfully", profile))
    }

    pub async fn search(
        State(state): State<SharedState>,
        Query(query): Query<ProfileSearchQuery>,
    ) -> ApiResult<ApiResponse<Vec<Profile>>> {
        let profiles = ProfileService::new(&state.data_context).search_profiles(&query)?;
        Ok(ApiResponse::ok("Profiles retrieved successfully", profiles))
    }

    pub async fn update(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<UpdateProfileRequest>,
    ) -> ApiResult<ApiResponse<Profile>> {
        let profile = ProfileService::new(&state.data_context).update_profile(user.user_id, body)?;
        Ok(ApiResponse::ok("Profile updated successfully", profile))
    }
}
