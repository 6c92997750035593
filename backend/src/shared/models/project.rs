use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{activity::ActivityLogEntry, task_status::TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: TaskStatus,
    /// 0-100, share of completed tasks.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub tasks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub activity_log: Vec<ActivityLogEntry>,
    #[serde(default)]
    pub team: Vec<Uuid>,
    pub manager: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.manager == user_id || self.team.contains(&user_id)
    }

    pub fn milestone_mut(&mut self, milestone_id: Uuid) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == milestone_id)
    }

    pub fn has_milestone(&self, milestone_id: Uuid) -> bool {
        self.milestones.iter().any(|m| m.id == milestone_id)
    }
}

/// Rounded percentage of `done` over `total`; zero when there is nothing to do.
pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_complete_rounds() {
        assert_eq!(percent_complete(0, 0), 0);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(4, 4), 100);
    }
}
