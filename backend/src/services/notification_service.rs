use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    notification::{NewNotification, Notification},
    notification_page::NotificationPage,
    notification_query::{NotificationQuery, DEFAULT_NOTIFICATION_LIMIT},
};

pub struct NotificationService<'a> {
    data: &'a DataContext,
}

impl<'a> NotificationService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn create_notification(&self, new: NewNotification) -> ApiResult<Notification> {
        let notification = Notification::new(new);
        self.data.put(&notification)?;
        debug!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            "notification created"
        );
        Ok(notification)
    }

    /// Fire-and-forget variant used by other services; failures are only logged.
    pub fn notify(&self, new: NewNotification) {
        let recipient_id = new.recipient_id;
        if let Err(e) = self.create_notification(new) {
            warn!(%recipient_id, error = %e, "failed to create notification");
        }
    }

    /// Newest first. `total` counts every notification matching the filter.
    pub fn get_user_notifications(&self, user_id: Uuid, query: NotificationQuery) -> ApiResult<NotificationPage> {
        let mut notifications: Vec<Notification> = self
            .data
            .scan::<Notification>()?
            .into_iter()
            .filter(|n| n.recipient_id == user_id)
            .filter(|n| query.is_read.map_or(true, |is_read| n.is_read == is_read))
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = notifications.len();
        let notifications = notifications
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT))
            .collect();
        Ok(NotificationPage { notifications, total })
    }

    pub fn get_unread_count(&self, user_id: Uuid) -> ApiResult<usize> {
        Ok(self
            .data
            .scan::<Notification>()?
            .iter()
            .filter(|n| n.recipient_id == user_id && !n.is_read)
            .count())
    }

    pub fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> ApiResult<Notification> {
        self.data
            .modify(id, |n: &mut Notification| -> ApiResult<Notification> {
                if n.recipient_id != user_id {
                    return Err(ApiError::not_found("Notification not found"));
                }
                n.is_read = true;
                n.updated_at = Utc::now();
                Ok(n.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Notification not found"))
    }

    /// Returns how many notifications changed state.
    pub fn mark_all_as_read(&self, user_id: Uuid) -> ApiResult<usize> {
        let unread: Vec<Uuid> = self
            .data
            .scan::<Notification>()?
            .into_iter()
            .filter(|n| n.recipient_id == user_id && !n.is_read)
            .map(|n| n.id)
            .collect();

        let mut modified = 0;
        for id in unread {
            let changed = self.data.modify(id, |n: &mut Notification| -> ApiResult<bool> {
                if n.is_read {
                    return Ok(false);
                }
                n.is_read = true;
                n.updated_at = Utc::now();
                Ok(true)
            })?;
            if changed == Some(true) {
                modified += 1;
            }
        }
        Ok(modified)
    }

    pub fn delete_notification(&self, id: Uuid, user_id: Uuid) -> ApiResult<()> {
        let owned = self
            .data
            .get::<Notification>(id)?
            .is_some_and(|n| n.recipient_id == user_id);
        if !owned || !self.data.remove::<Notification>(id)? {
            return Err(ApiError::not_found("Notification not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_access::data_context::tests::temp_db,
        notification::{NotificationType, RelatedRef},
    };
    use chrono::Duration;

    fn note(recipient_id: Uuid, message: &str) -> NewNotification {
        NewNotification {
            recipient_id,
            message: message.into(),
            kind: NotificationType::Update,
            related: Some(RelatedRef::task(Uuid::new_v4())),
        }
    }

    #[test]
    fn list_filters_and_counts_before_paging() {
        let db = temp_db("notify_list");
        let service = NotificationService::new(&db.data);
        let me = Uuid::new_v4();
        let base = Utc::now();
        for i in 0..5 {
            let mut notification = Notification::new(note(me, &format!("n{i}")));
            notification.created_at = base + Duration::minutes(i);
            db.data.put(&notification).unwrap();
        }
        service.create_notification(note(Uuid::new_v4(), "someone else")).unwrap();

        let page = service
            .get_user_notifications(me, NotificationQuery { is_read: Some(false), limit: Some(2), skip: Some(1) })
            .unwrap();
        assert_eq!(page.total, 5);
        assert!(page.notifications.iter().all(|n| n.recipient_id == me));
        let messages: Vec<&str> = page.notifications.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["n3", "n2"]);
    }

    #[test]
    fn mark_as_read_checks_ownership() {
        let db = temp_db("notify_read");
        let service = NotificationService::new(&db.data);
        let me = Uuid::new_v4();
        let mine = service.create_notification(note(me, "hello")).unwrap();

        let stranger = service.mark_as_read(mine.id, Uuid::new_v4());
        assert!(matches!(stranger, Err(ApiError::NotFound(_))));
        assert_eq!(service.get_unread_count(me).unwrap(), 1);

        assert!(service.mark_as_read(mine.id, me).unwrap().is_read);
        assert_eq!(service.get_unread_count(me).unwrap(), 0);
    }

    #[test]
    fn mark_all_reports_changes() {
        let db = temp_db("notify_all");
        let service = NotificationService::new(&db.data);
        let me = Uuid::new_v4();
        let first = service.create_notification(note(me, "a")).unwrap();
        service.create_notification(note(me, "b")).unwrap();
        service.create_notification(note(me, "c")).unwrap();
        service.mark_as_read(first.id, me).unwrap();

        assert_eq!(service.mark_all_as_read(me).unwrap(), 2);
        assert_eq!(service.mark_all_as_read(me).unwrap(), 0);
    }

    #[test]
    fn delete_only_own_notifications() {
        let db = temp_db("notify_delete");
        let service = NotificationService::new(&db.data);
        let me = Uuid::new_v4();
        let mine = service.create_notification(note(me, "a")).unwrap();

        assert!(service.delete_notification(mine.id, Uuid::new_v4()).is_err());
        service.delete_notification(mine.id, me).unwrap();
        assert!(matches!(service.delete_notification(mine.id, me), Err(ApiError::NotFound(_))));
    }
}
