use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCounts {
    pub super_admin: usize,
    pub project_manager: usize,
    pub developer: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAnalyticsResponse {
    pub total_users: usize,
    pub users_by_role: RoleCounts,
    pub blocked_users: usize,
    pub total_projects: usize,
    pub tasks_by_status: StatusCounts,
    pub active_subscriptions: usize,
    pub total_ratings: usize,
}
