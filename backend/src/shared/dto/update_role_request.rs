use serde::Deserialize;

use crate::role::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
