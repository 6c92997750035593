use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{role::Role, user_get_response::UserGetResponse};

/// Authentication record. Display data lives on the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub paid: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash,
            role,
            paid: false,
            is_active: true,
            is_blocked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_sign_in(&self) -> bool {
        self.is_active && !self.is_blocked
    }

    pub fn to_get_dto(&self, name: String) -> UserGetResponse {
        UserGetResponse {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            name,
            paid: self.paid,
            is_active: self.is_active,
            is_blocked: self.is_blocked,
            created_at: self.created_at,
        }
    }
}
