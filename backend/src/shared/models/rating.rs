use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RatedEntityType {
    Task,
    Project,
}

impl RatedEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatedEntityType::Task => "task",
            RatedEntityType::Project => "project",
        }
    }
}

impl fmt::Display for RatedEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub entity_type: RatedEntityType,
    pub entity_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub related_entity: RelatedEntity,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Storage key enforcing one rating per rater and entity.
    pub fn uniqueness_key(from_user_id: Uuid, entity: RelatedEntity) -> String {
        format!("{}:{}:{}", from_user_id, entity.entity_type, entity.entity_id)
    }
}
