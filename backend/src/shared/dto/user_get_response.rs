use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// A user as admins see it: the auth record minus the hash, plus the display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGetResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub paid: bool,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}
