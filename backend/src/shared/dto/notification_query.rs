use serde::Deserialize;

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub is_read: Option<bool>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}
