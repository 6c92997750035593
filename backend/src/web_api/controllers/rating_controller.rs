use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::AuthUser,
    create_rating_request::CreateRatingRequest,
    error::ApiResult,
    page_query::PageQuery,
    rating::{RatedEntityType, Rating, RelatedEntity},
    rating_view::{AverageRatingResponse, HasRatedResponse, RatingPage, RatingsBreakdownResponse},
    services::{project_service::ProjectService, rating_service::RatingService, task_service::TaskService},
};

pub struct RatingController {}

macro_rules! rating_service {
    ($state:expr, $svc:ident) => {
        let tasks = TaskService::new(&$state.data_context);
        let projects = ProjectService::new(&$state.data_context);
        let $svc = RatingService::new(&$state.data_context, &tasks, &projects);
    };
}

impl RatingController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreateRatingRequest>,
    ) -> ApiResult<ApiResponse<Rating>> {
        rating_service!(state, service);
        let rating = service.create_rating(user.user_id, body)?;
        Ok(ApiResponse::created("Rating submitted successfully", rating))
    }

    pub async fn get_user_ratings(
        State(state): State<SharedState>,
        Path(user_id): Path<Uuid>,
        Query(page): Query<PageQuery>,
    ) -> ApiResult<ApiResponse<RatingPage>> {
        rating_service!(state, service);
        let ratings = service.get_user_ratings(user_id, page)?;
        Ok(ApiResponse::ok("Ratings retrieved successfully", ratings))
    }

    pub async fn get_average(
        State(state): State<SharedState>,
        Path(user_id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<AverageRatingResponse>> {
        rating_service!(state, service);
        let average = service.get_average_rating(user_id)?;
        Ok(ApiResponse::ok("Average rating retrieved successfully", average))
    }

    pub async fn get_breakdown(
        State(state): State<SharedState>,
        Path(user_id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<RatingsBreakdownResponse>> {
        rating_service!(state, service);
        let breakdown = service.get_ratings_breakdown(user_id)?;
        Ok(ApiResponse::ok("Ratings breakdown retrieved successfully", breakdown))
    }

    pub async fn get_given(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<Vec<Rating>>> {
        rating_service!(state, service);
        let ratings = service.get_ratings_given_by_user(user.user_id)?;
        Ok(ApiResponse::ok("Given ratings retrieved successfully", ratings))
    }

    pub async fn get_received(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Query(page): Query<PageQuery>,
    ) -> ApiResult<ApiResponse<RatingPage>> {
        rating_service!(state, service);
        let ratings = service.get_user_ratings(user.user_id, page)?;
        Ok(ApiResponse::ok("Received ratings retrieved successfully", ratings))
    }

    pub async fn check(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path((entity_type, entity_id)): Path<(RatedEntityType, Uuid)>,
    ) -> ApiResult<ApiResponse<HasRatedResponse>> {
        rating_service!(state, service);
        let has_rated = service.has_user_rated(user.user_id, RelatedEntity { entity_type, entity_id })?;
        Ok(ApiResponse::ok("Rating status retrieved successfully", HasRatedResponse { has_rated }))
    }
}
