use serde::Deserialize;
use uuid::Uuid;

use crate::rating::RatedEntityType;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub to_user_id: Uuid,
    pub entity_type: RatedEntityType,
    pub entity_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}
