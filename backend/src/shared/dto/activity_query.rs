use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::activity::ActivityAction;

/// In-memory filter applied after the whole log is loaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub action: Option<ActivityAction>,
    pub user_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}
