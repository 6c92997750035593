use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    activity::{ActivityLogEntry, EntityType, NewActivity},
    activity_query::ActivityQuery,
    activity_view::ActivityView,
    data_access::{data_context::DataContext, lookups::TaskLookup},
    error::{ApiError, ApiResult},
    project::Project,
};

/// Appends to and reads from the activity log embedded in each project.
pub struct ActivityService<'a> {
    data: &'a DataContext,
}

impl<'a> ActivityService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn log_activity(&self, project_id: Uuid, activity: NewActivity) -> ApiResult<ActivityLogEntry> {
        let entry = self
            .data
            .modify(project_id, |project: &mut Project| -> ApiResult<ActivityLogEntry> {
                let entry = ActivityLogEntry::record(activity, Utc::now());
                project.activity_log.push(entry.clone());
                Ok(entry)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        debug!(%project_id, action = ?entry.action, entity_id = %entry.entity_id, "activity logged");
        Ok(entry)
    }

    /// Side-effect form: the primary write already happened, so a failure here
    /// is logged and swallowed.
    pub fn record(&self, project_id: Uuid, activity: NewActivity) {
        let action = activity.action;
        if let Err(e) = self.log_activity(project_id, activity) {
            warn!(%project_id, ?action, error = %e, "failed to append activity entry");
        }
    }

    pub fn get_project_activity(&self, project_id: Uuid, query: &ActivityQuery) -> ApiResult<Vec<ActivityView>> {
        let project = self
            .data
            .get::<Project>(project_id)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        self.with_names(select(project.activity_log, query))
    }

    /// Entries written by `user_id` across every project they manage or belong to.
    pub fn get_user_activity(&self, user_id: Uuid, query: &ActivityQuery) -> ApiResult<Vec<ActivityView>> {
        let entries: Vec<ActivityLogEntry> = self
            .data
            .scan::<Project>()?
            .into_iter()
            .filter(|p| p.involves(user_id))
            .flat_map(|p| p.activity_log)
            .filter(|entry| entry.user_id == user_id)
            .collect();
        let query = ActivityQuery { user_id: None, ..query.clone() };
        self.with_names(select(entries, &query))
    }

    /// When `project_id` is omitted it is resolved from the task.
    pub fn get_task_activity(
        &self,
        task_id: Uuid,
        project_id: Option<Uuid>,
        tasks: &dyn TaskLookup,
    ) -> ApiResult<Vec<ActivityView>> {
        let project_id = match project_id {
            Some(id) => id,
            None => {
                tasks
                    .find_task(task_id)?
                    .ok_or_else(|| ApiError::not_found("Task not found"))?
                    .project_id
            }
        };
        let project = self
            .data
            .get::<Project>(project_id)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        let entries = project
            .activity_log
            .into_iter()
            .filter(|entry| entry.entity_type == EntityType::Task && entry.entity_id == task_id)
            .collect();
        self.with_names(select(entries, &ActivityQuery::default()))
    }

    fn with_names(&self, entries: Vec<ActivityLogEntry>) -> ApiResult<Vec<ActivityView>> {
        let names = self.data.display_names(entries.iter().map(|e| e.user_id))?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let user_name = names.get(&entry.user_id).cloned().unwrap_or_default();
                ActivityView { entry, user_name }
            })
            .collect())
    }
}

/// Filter, newest first, then skip/limit. Equal timestamps keep the later
/// append first. A zero limit means no limit.
pub fn select(entries: Vec<ActivityLogEntry>, query: &ActivityQuery) -> Vec<ActivityLogEntry> {
    let mut indexed: Vec<(usize, ActivityLogEntry)> = entries
        .into_iter()
        .enumerate()
        .filter(|(_, e)| query.start_date.map_or(true, |start| e.timestamp >= start))
        .filter(|(_, e)| query.end_date.map_or(true, |end| e.timestamp <= end))
        .filter(|(_, e)| query.action.map_or(true, |action| e.action == action))
        .filter(|(_, e)| query.user_id.map_or(true, |user_id| e.user_id == user_id))
        .collect();

    indexed.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));

    let limit = query.limit.filter(|limit| *limit > 0).unwrap_or(usize::MAX);
    indexed
        .into_iter()
        .map(|(_, entry)| entry)
        .skip(query.skip.unwrap_or(0))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activity::{ActivityAction, ActivityDetails},
        data_access::data_context::{
            tests::{seed_project, seed_user, temp_db},
            DataError,
        },
        role::Role,
        task::Task,
    };
    use chrono::{DateTime, Duration};

    fn entry(user_id: Uuid, action: ActivityAction, timestamp: DateTime<Utc>) -> ActivityLogEntry {
        ActivityLogEntry {
            id: Uuid::new_v4(),
            user_id,
            action,
            entity_type: EntityType::Task,
            entity_id: Uuid::new_v4(),
            details: ActivityDetails::default(),
            timestamp,
        }
    }

    struct NoTasks;

    impl TaskLookup for NoTasks {
        fn find_task(&self, _id: Uuid) -> Result<Option<Task>, DataError> {
            Ok(None)
        }
    }

    #[test]
    fn pagination_applies_after_sorting() {
        let base = Utc::now();
        let user = Uuid::new_v4();
        let entries: Vec<ActivityLogEntry> = (0..10)
            .map(|i| entry(user, ActivityAction::TaskUpdated, base + Duration::seconds(i)))
            .collect();
        let expected: Vec<Uuid> = entries.iter().rev().skip(2).take(3).map(|e| e.id).collect();

        let query = ActivityQuery { limit: Some(3), skip: Some(2), ..Default::default() };
        let picked: Vec<Uuid> = select(entries, &query).into_iter().map(|e| e.id).collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn filters_by_action_actor_and_window() {
        let base = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let entries = vec![
            entry(alice, ActivityAction::StatusChanged, base),
            entry(bob, ActivityAction::StatusChanged, base + Duration::seconds(1)),
            entry(alice, ActivityAction::CommentAdded, base + Duration::seconds(2)),
            entry(alice, ActivityAction::StatusChanged, base + Duration::seconds(3)),
        ];

        let query = ActivityQuery {
            action: Some(ActivityAction::StatusChanged),
            user_id: Some(alice),
            end_date: Some(base + Duration::seconds(2)),
            ..Default::default()
        };
        let picked = select(entries, &query);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].timestamp, base);
    }

    #[test]
    fn equal_timestamps_return_latest_append_first() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let first = entry(user, ActivityAction::TaskCreated, now);
        let second = entry(user, ActivityAction::TaskUpdated, now);
        let picked = select(vec![first.clone(), second.clone()], &ActivityQuery::default());
        assert_eq!(picked[0].id, second.id);
        assert_eq!(picked[1].id, first.id);
    }

    #[test]
    fn log_activity_requires_project() {
        let db = temp_db("activity_missing");
        let service = ActivityService::new(&db.data);
        let result = service.log_activity(
            Uuid::new_v4(),
            NewActivity {
                user_id: Uuid::new_v4(),
                action: ActivityAction::TaskCreated,
                entity_type: EntityType::Task,
                entity_id: Uuid::new_v4(),
                details: ActivityDetails::default(),
            },
        );
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn project_and_user_activity_join_names() {
        let db = temp_db("activity_read");
        let manager = seed_user(&db.data, Role::ProjectManager, Some("Grace"));
        let project = seed_project(&db.data, manager.id);
        let service = ActivityService::new(&db.data);

        let task_id = Uuid::new_v4();
        for action in [ActivityAction::TaskCreated, ActivityAction::StatusChanged] {
            service
                .log_activity(
                    project.id,
                    NewActivity {
                        user_id: manager.id,
                        action,
                        entity_type: EntityType::Task,
                        entity_id: task_id,
                        details: ActivityDetails::describe("x"),
                    },
                )
                .unwrap();
        }

        let views = service.get_project_activity(project.id, &ActivityQuery::default()).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].user_name, "Grace");
        assert_eq!(views[0].entry.action, ActivityAction::StatusChanged);

        let mine = service.get_user_activity(manager.id, &ActivityQuery::default()).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(service.get_user_activity(Uuid::new_v4(), &ActivityQuery::default()).unwrap().is_empty());

        let for_task = service.get_task_activity(task_id, Some(project.id), &NoTasks).unwrap();
        assert_eq!(for_task.len(), 2);
        assert!(matches!(
            service.get_task_activity(task_id, None, &NoTasks),
            Err(ApiError::NotFound(_))
        ));
    }
}
