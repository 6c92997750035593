use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    activity::{ActivityAction, ActivityDetails, EntityType, NewActivity},
    add_comment_request::AddCommentRequest,
    authentication::auth::AuthUser,
    create_task_request::CreateTaskRequest,
    data_access::{data_context::{DataContext, DataError}, lookups::TaskLookup},
    error::{ApiError, ApiResult},
    log_time_request::LogTimeRequest,
    notification::{NewNotification, NotificationType, RelatedRef},
    project::Project,
    role::Role,
    services::{
        activity_service::ActivityService, notification_service::NotificationService,
        project_service::ProjectService,
    },
    task::{Comment, Task, TimeLog},
    task_detail_response::{DependencySummary, TaskDetailResponse},
    task_list_query::TaskListQuery,
    task_status::TaskStatus,
    update_task_request::UpdateTaskRequest,
    user::User,
};

pub struct TaskService<'a> {
    data: &'a DataContext,
}

impl TaskLookup for TaskService<'_> {
    fn find_task(&self, id: Uuid) -> Result<Option<Task>, DataError> {
        self.data.get(id)
    }
}

/// Which of the three time-log forms a request is.
enum TimeEntry {
    Manual { start: DateTime<Utc>, end: DateTime<Utc> },
    Start(DateTime<Utc>),
    Stop(DateTime<Utc>),
}

impl TimeEntry {
    fn parse(request: &LogTimeRequest) -> ApiResult<TimeEntry> {
        match (request.start_time, request.end_time) {
            (Some(start), Some(end)) if end < start => {
                Err(ApiError::bad_request("End time must be after start time"))
            }
            (Some(start), Some(end)) => Ok(TimeEntry::Manual { start, end }),
            (Some(start), None) => Ok(TimeEntry::Start(start)),
            (None, Some(end)) => Ok(TimeEntry::Stop(end)),
            (None, None) => Err(ApiError::bad_request("startTime or endTime is required")),
        }
    }
}

/// True when `task_id` is reachable from any of `dependencies` through the
/// dependency edges in `graph`.
fn creates_cycle(task_id: Uuid, dependencies: &[Uuid], graph: &HashMap<Uuid, Vec<Uuid>>) -> bool {
    let mut stack: Vec<Uuid> = dependencies.to_vec();
    let mut seen = HashSet::new();
    while let Some(next) = stack.pop() {
        if next == task_id {
            return true;
        }
        if !seen.insert(next) {
            continue;
        }
        if let Some(children) = graph.get(&next) {
            stack.extend(children.iter().copied());
        }
    }
    false
}

/// Drops repeated ids, keeping first occurrences in order.
fn dedup_ids(ids: &mut Vec<Uuid>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

fn ensure_may_work_on(task: &Task, actor: &AuthUser, message: &str) -> ApiResult<()> {
    if actor.is(Role::Developer) && !task.is_assigned_to(actor.user_id) {
        return Err(ApiError::forbidden(message));
    }
    Ok(())
}

impl<'a> TaskService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    fn activity(&self) -> ActivityService<'a> {
        ActivityService::new(self.data)
    }

    fn notifications(&self) -> NotificationService<'a> {
        NotificationService::new(self.data)
    }

    fn projects(&self) -> ProjectService<'a> {
        ProjectService::new(self.data)
    }

    fn load(&self, id: Uuid) -> ApiResult<Task> {
        self.data
            .get::<Task>(id)?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    /// Every id must exist, must not be the task itself and must not close a cycle.
    fn validate_dependencies(&self, task_id: Uuid, dependencies: &[Uuid]) -> ApiResult<()> {
        let tasks = self.data.scan::<Task>()?;
        let known: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        for dependency in dependencies {
            if *dependency == task_id {
                return Err(ApiError::bad_request("A task cannot depend on itself"));
            }
            if !known.contains(dependency) {
                return Err(ApiError::not_found(format!("Dependency task {dependency} not found")));
            }
        }

        let graph: HashMap<Uuid, Vec<Uuid>> = tasks
            .into_iter()
            .filter(|t| t.id != task_id)
            .map(|t| (t.id, t.dependencies))
            .collect();
        if creates_cycle(task_id, dependencies, &graph) {
            return Err(ApiError::bad_request("Dependencies would create a circular dependency"));
        }
        Ok(())
    }

    /// Fails naming every dependency that is not completed. Missing ones count.
    fn ensure_dependencies_completed(&self, dependencies: &[Uuid], target: TaskStatus) -> ApiResult<()> {
        let mut blocking = Vec::new();
        for dependency in dependencies {
            match self.data.get::<Task>(*dependency)? {
                Some(task) if task.status == TaskStatus::Completed => {}
                Some(task) => blocking.push(format!("{} ({})", task.title, task.status)),
                None => blocking.push(format!("{dependency} (not found)")),
            }
        }
        if blocking.is_empty() {
            Ok(())
        } else {
            Err(ApiError::bad_request(format!(
                "Cannot move task to {target}: incomplete dependencies: {}",
                blocking.join(", ")
            )))
        }
    }

    fn ensure_user_exists(&self, user_id: Uuid) -> ApiResult<()> {
        match self.data.get::<User>(user_id)? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("Assignee not found")),
        }
    }

    #[instrument(skip(self, request, actor), fields(actor = %actor.user_id))]
    pub fn create_task(&self, request: CreateTaskRequest, actor: &AuthUser) -> ApiResult<Task> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::bad_request("Task title is required"));
        }
        if request.estimated_time < 0.0 {
            return Err(ApiError::bad_request("Estimated time cannot be negative"));
        }
        let project = self
            .data
            .get::<Project>(request.project_id)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        if let Some(milestone_id) = request.milestone_id {
            if !project.has_milestone(milestone_id) {
                return Err(ApiError::not_found("Milestone not found"));
            }
        }
        if let Some(assignee_id) = request.assignee_id {
            self.ensure_user_exists(assignee_id)?;
        }

        let id = Uuid::new_v4();
        let mut dependencies = request.dependencies;
        dedup_ids(&mut dependencies);
        self.validate_dependencies(id, &dependencies)?;
        if request.status.requires_completed_dependencies() {
            self.ensure_dependencies_completed(&dependencies, request.status)?;
        }

        let now = Utc::now();
        let mut task = Task {
            id,
            title,
            description: request.description,
            priority: request.priority,
            deadline: request.deadline,
            estimated_time: request.estimated_time,
            status: TaskStatus::NotStarted,
            time_logged: 0,
            start_date: None,
            completed_date: None,
            project_id: project.id,
            milestone_id: request.milestone_id,
            assignee_id: request.assignee_id,
            comments: vec![],
            attachments: vec![],
            dependencies,
            time_logs: vec![],
            created_at: now,
            updated_at: now,
        };
        task.set_status(request.status, now);
        self.data.put(&task)?;
        info!(task_id = %task.id, project_id = %task.project_id, "task created");

        self.activity().record(
            task.project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::TaskCreated,
                entity_type: EntityType::Task,
                entity_id: task.id,
                details: ActivityDetails::describe(format!("Task \"{}\" created", task.title)),
            },
        );
        if let Some(assignee_id) = task.assignee_id {
            self.notify_assignment(&task, assignee_id);
        }
        if task.milestone_id.is_some() {
            let moved = self
                .projects()
                .move_task_between_milestones(task.project_id, task.id, None, task.milestone_id);
            if let Err(e) = moved {
                warn!(task_id = %task.id, error = %e, "failed to attach task to milestone");
            }
        }
        self.projects().refresh_progress_or_warn(task.project_id);
        Ok(task)
    }

    /// Newest first.
    pub fn get_all_tasks(&self, query: &TaskListQuery) -> ApiResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .data
            .scan::<Task>()?
            .into_iter()
            .filter(|t| query.project_id.map_or(true, |id| t.project_id == id))
            .filter(|t| query.assignee_id.map_or(true, |id| t.assignee_id == Some(id)))
            .filter(|t| query.status.map_or(true, |status| t.status == status))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    pub fn get_task_by_id(&self, id: Uuid) -> ApiResult<TaskDetailResponse> {
        let task = self.load(id)?;
        let mut dependency_details = Vec::with_capacity(task.dependencies.len());
        for dependency in &task.dependencies {
            if let Some(dep) = self.data.get::<Task>(*dependency)? {
                dependency_details.push(DependencySummary {
                    id: dep.id,
                    title: dep.title,
                    status: dep.status,
                });
            }
        }
        Ok(TaskDetailResponse { task, dependency_details })
    }

    #[instrument(skip(self, changes, actor), fields(actor = %actor.user_id))]
    pub fn update_task(&self, id: Uuid, mut changes: UpdateTaskRequest, actor: &AuthUser) -> ApiResult<Task> {
        let current = self.load(id)?;
        ensure_may_work_on(&current, actor, "You can only update tasks assigned to you")?;

        if changes.estimated_time.is_some_and(|hours| hours < 0.0) {
            return Err(ApiError::bad_request("Estimated time cannot be negative"));
        }
        if let Some(dependencies) = changes.dependencies.as_mut() {
            dedup_ids(dependencies);
        }
        if let Some(dependencies) = &changes.dependencies {
            self.validate_dependencies(id, dependencies)?;
        }
        if let Some(status) = changes.status {
            if status.requires_completed_dependencies() {
                let dependencies = changes.dependencies.as_deref().unwrap_or(&current.dependencies);
                self.ensure_dependencies_completed(dependencies, status)?;
            }
        }
        if let Some(assignee_id) = changes.assignee_id {
            self.ensure_user_exists(assignee_id)?;
        }
        if let Some(milestone_id) = changes.milestone_id {
            let project = self
                .data
                .get::<Project>(current.project_id)?
                .ok_or_else(|| ApiError::not_found("Project not found"))?;
            if !project.has_milestone(milestone_id) {
                return Err(ApiError::not_found("Milestone not found"));
            }
        }
        if let Some(title) = changes.title.as_deref() {
            if title.trim().is_empty() {
                return Err(ApiError::bad_request("Task title is required"));
            }
        }

        let (before, task) = self
            .data
            .modify(id, |task: &mut Task| -> ApiResult<(Task, Task)> {
                ensure_may_work_on(task, actor, "You can only update tasks assigned to you")?;
                let before = task.clone();
                let now = Utc::now();
                if let Some(title) = changes.title.as_deref() {
                    task.title = title.trim().to_string();
                }
                if let Some(description) = &changes.description {
                    task.description = Some(description.clone());
                }
                if let Some(priority) = changes.priority {
                    task.priority = priority;
                }
                if let Some(deadline) = changes.deadline {
                    task.deadline = deadline;
                }
                if let Some(estimated_time) = changes.estimated_time {
                    task.estimated_time = estimated_time;
                }
                if let Some(assignee_id) = changes.assignee_id {
                    task.assignee_id = Some(assignee_id);
                }
                if let Some(milestone_id) = changes.milestone_id {
                    task.milestone_id = Some(milestone_id);
                }
                if let Some(dependencies) = &changes.dependencies {
                    task.dependencies = dependencies.clone();
                }
                if let Some(status) = changes.status {
                    if status != task.status {
                        task.set_status(status, now);
                    }
                }
                task.updated_at = now;
                Ok((before, task.clone()))
            })?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;

        // Side effects below run after the task write and never roll it back.
        let status_changed = before.status != task.status;
        let details = if status_changed {
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::StatusChanged,
                entity_type: EntityType::Task,
                entity_id: task.id,
                details: ActivityDetails::change(json!(before.status), json!(task.status))
                    .with_description(format!("Status changed from {} to {}", before.status, task.status)),
            }
        } else {
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::TaskUpdated,
                entity_type: EntityType::Task,
                entity_id: task.id,
                details: ActivityDetails {
                    new_value: serde_json::to_value(&changes).ok(),
                    ..Default::default()
                },
            }
        };
        self.activity().record(task.project_id, details);

        if let Some(assignee_id) = task.assignee_id {
            if before.assignee_id != Some(assignee_id) {
                self.notify_assignment(&task, assignee_id);
            }
        }
        if status_changed {
            self.notify_manager_of_status(&task, actor);
        }
        if before.milestone_id != task.milestone_id {
            let moved = self.projects().move_task_between_milestones(
                task.project_id,
                task.id,
                before.milestone_id,
                task.milestone_id,
            );
            if let Err(e) = moved {
                warn!(task_id = %task.id, error = %e, "failed to move task between milestones");
            }
        }
        if status_changed || before.milestone_id != task.milestone_id {
            self.projects().refresh_progress_or_warn(task.project_id);
        }
        info!(task_id = %task.id, status = %task.status, "task updated");
        Ok(task)
    }

    fn notify_assignment(&self, task: &Task, assignee_id: Uuid) {
        self.notifications().notify(NewNotification {
            recipient_id: assignee_id,
            message: format!("You have been assigned to task: {}", task.title),
            kind: NotificationType::Assignment,
            related: Some(RelatedRef::task(task.id)),
        });
    }

    fn notify_manager_of_status(&self, task: &Task, actor: &AuthUser) {
        let manager = match self.data.get::<Project>(task.project_id) {
            Ok(Some(project)) => project.manager,
            Ok(None) => return,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "cannot resolve project manager");
                return;
            }
        };
        if manager == actor.user_id {
            return;
        }
        self.notifications().notify(NewNotification {
            recipient_id: manager,
            message: format!("Task \"{}\" status changed to {}", task.title, task.status),
            kind: NotificationType::Update,
            related: Some(RelatedRef::task(task.id)),
        });
    }

    /// Manual interval, timer start or timer stop depending on which times are set.
    #[instrument(skip(self, request, actor), fields(actor = %actor.user_id))]
    pub fn log_time(&self, id: Uuid, actor: &AuthUser, request: LogTimeRequest) -> ApiResult<Task> {
        let entry = TimeEntry::parse(&request)?;
        let user_id = actor.user_id;

        let task = self
            .data
            .modify(id, |task: &mut Task| -> ApiResult<Task> {
                ensure_may_work_on(task, actor, "You can only log time on tasks assigned to you")?;
                match entry {
                    TimeEntry::Manual { start, end } => {
                        task.time_logs.push(TimeLog::closed(user_id, start, end));
                    }
                    TimeEntry::Start(start) => {
                        if task.open_log_index(user_id).is_some() {
                            return Err(ApiError::Conflict("A timer is already running for this task".into()));
                        }
                        task.time_logs.push(TimeLog::open(user_id, start));
                    }
                    TimeEntry::Stop(end) => {
                        let index = task
                            .open_log_index(user_id)
                            .ok_or_else(|| ApiError::bad_request("No running timer for this task"))?;
                        if end < task.time_logs[index].start_time {
                            return Err(ApiError::bad_request("End time must be after start time"));
                        }
                        task.time_logs[index].close(end);
                    }
                }
                task.recompute_time_logged();
                task.updated_at = Utc::now();
                Ok(task.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;

        if let (Some(start), Some(end)) = (request.start_time, request.end_time) {
            let seconds = (end - start).num_seconds();
            self.activity().record(
                task.project_id,
                NewActivity {
                    user_id,
                    action: ActivityAction::TimeLogged,
                    entity_type: EntityType::Task,
                    entity_id: task.id,
                    details: ActivityDetails::describe(format!("Logged {} minutes", seconds / 60))
                        .with_metadata(json!({ "duration": seconds })),
                },
            );
        }
        Ok(task)
    }

    pub fn add_comment(&self, id: Uuid, actor: &AuthUser, request: AddCommentRequest) -> ApiResult<Comment> {
        let text = request.text.trim().to_string();
        if text.is_empty() {
            return Err(ApiError::bad_request("Comment text is required"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            text,
            author_id: actor.user_id,
            timestamp: Utc::now(),
            is_private: request.is_private,
        };
        let task = self
            .data
            .modify(id, |task: &mut Task| -> ApiResult<Task> {
                task.comments.push(comment.clone());
                task.updated_at = Utc::now();
                Ok(task.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;

        self.activity().record(
            task.project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::CommentAdded,
                entity_type: EntityType::Task,
                entity_id: task.id,
                details: ActivityDetails::describe("Comment added")
                    .with_metadata(json!({ "commentId": comment.id })),
            },
        );
        if let Some(assignee_id) = task.assignee_id.filter(|id| *id != actor.user_id) {
            self.notifications().notify(NewNotification {
                recipient_id: assignee_id,
                message: format!("New comment on task: {}", task.title),
                kind: NotificationType::Mention,
                related: Some(RelatedRef::task(task.id)),
            });
        }
        Ok(comment)
    }
}
