use serde::Serialize;

use crate::notification::Notification;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkAllReadResponse {
    pub modified: usize,
}
