use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Assignment,
    Update,
    Payment,
    Deadline,
    Mention,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelatedKind {
    Task,
    Project,
    Milestone,
    Payment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRef {
    pub entity_type: RelatedKind,
    pub entity_id: Uuid,
}

impl RelatedRef {
    pub fn task(id: Uuid) -> Self {
        Self { entity_type: RelatedKind::Task, entity_id: id }
    }

    pub fn project(id: Uuid) -> Self {
        Self { entity_type: RelatedKind::Project, entity_id: id }
    }

    pub fn payment(id: Uuid) -> Self {
        Self { entity_type: RelatedKind::Payment, entity_id: id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedRef>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub related: Option<RelatedRef>,
}

impl Notification {
    pub fn new(new: NewNotification) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            message: new.message,
            kind: new.kind,
            related: new.related,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }
}
