use serde::Serialize;
use uuid::Uuid;

use crate::role::Role;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SignedInUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedInUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
}
