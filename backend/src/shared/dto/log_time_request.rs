use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Both times: manual entry. Start only: start a timer. End only: stop it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTimeRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}
