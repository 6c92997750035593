use serde::Serialize;

use crate::activity::ActivityLogEntry;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(flatten)]
    pub entry: ActivityLogEntry,
    pub user_name: String,
}
