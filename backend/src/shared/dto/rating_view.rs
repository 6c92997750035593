use serde::Serialize;

use crate::{profile::RatingsBreakdown, rating::Rating};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub from_user_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingPage {
    pub ratings: Vec<RatingView>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageRatingResponse {
    pub average_rating: f64,
    pub total_ratings: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingsBreakdownResponse {
    pub ratings_breakdown: RatingsBreakdown,
    pub total_ratings: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasRatedResponse {
    pub has_rated: bool,
}
