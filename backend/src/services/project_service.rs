use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    activity::{ActivityAction, ActivityDetails, EntityType, NewActivity},
    authentication::auth::AuthUser,
    create_milestone_request::CreateMilestoneRequest,
    create_project_request::CreateProjectRequest,
    dashboard_stats_response::DashboardStatsResponse,
    data_access::{data_context::{DataContext, DataError}, lookups::ProjectLookup},
    error::{ApiError, ApiResult},
    notification::{NewNotification, NotificationType, RelatedRef},
    project::{percent_complete, Milestone, Project},
    project_detail_response::ProjectDetailResponse,
    role::Role,
    services::{activity_service::ActivityService, notification_service::NotificationService},
    task::Task,
    task_status::TaskStatus,
    update_milestone_request::UpdateMilestoneRequest,
    update_project_request::UpdateProjectRequest,
    user::User,
};

pub struct ProjectService<'a> {
    data: &'a DataContext,
}

impl ProjectLookup for ProjectService<'_> {
    fn find_project(&self, id: Uuid) -> Result<Option<Project>, DataError> {
        self.data.get(id)
    }
}

/// Super admins manage every project; otherwise only the project's manager does.
fn ensure_can_manage(project: &Project, actor: &AuthUser) -> ApiResult<()> {
    if actor.is(Role::SuperAdmin) || project.manager == actor.user_id {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the project manager can change this project"))
    }
}

impl<'a> ProjectService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    fn activity(&self) -> ActivityService<'a> {
        ActivityService::new(self.data)
    }

    fn notifications(&self) -> NotificationService<'a> {
        NotificationService::new(self.data)
    }

    fn load(&self, id: Uuid) -> ApiResult<Project> {
        self.data
            .get::<Project>(id)?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    pub fn create_project(&self, request: CreateProjectRequest, actor: &AuthUser) -> ApiResult<Project> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Project name is required"));
        }
        if request.end_date < request.start_date {
            return Err(ApiError::bad_request("End date must be after start date"));
        }
        if request.budget < 0.0 {
            return Err(ApiError::bad_request("Budget cannot be negative"));
        }

        let mut team = Vec::new();
        for member in request.team {
            if team.contains(&member) {
                continue;
            }
            if self.data.get::<User>(member)?.is_none() {
                return Err(ApiError::not_found(format!("User {member} not found")));
            }
            team.push(member);
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: request.description,
            start_date: request.start_date,
            end_date: request.end_date,
            budget: request.budget,
            progress: 0,
            status: TaskStatus::NotStarted,
            milestones: vec![],
            activity_log: vec![],
            team,
            manager: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        self.data.put(&project)?;
        info!(project_id = %project.id, manager = %actor.user_id, "project created");

        for member in &project.team {
            self.notifications().notify(NewNotification {
                recipient_id: *member,
                message: format!("You have been added to project: {}", project.name),
                kind: NotificationType::Assignment,
                related: Some(RelatedRef::project(project.id)),
            });
        }
        Ok(project)
    }

    /// Super admins see everything, managers what they manage, developers
    /// the projects they are on.
    pub fn get_all_projects(&self, actor: &AuthUser) -> ApiResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .data
            .scan::<Project>()?
            .into_iter()
            .filter(|p| match actor.role {
                Role::SuperAdmin => true,
                Role::ProjectManager => p.manager == actor.user_id,
                Role::Developer => p.team.contains(&actor.user_id),
            })
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    pub fn get_project_by_id(&self, id: Uuid) -> ApiResult<ProjectDetailResponse> {
        let project = self.load(id)?;
        let mut tasks: Vec<Task> = self
            .data
            .scan::<Task>()?
            .into_iter()
            .filter(|t| t.project_id == id)
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(ProjectDetailResponse { project, tasks })
    }

    pub fn update_project(&self, id: Uuid, changes: UpdateProjectRequest, actor: &AuthUser) -> ApiResult<Project> {
        let project = self
            .data
            .modify(id, |project: &mut Project| -> ApiResult<Project> {
                ensure_can_manage(project, actor)?;
                if let Some(name) = changes.name.as_deref() {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(ApiError::bad_request("Project name is required"));
                    }
                    project.name = name.to_string();
                }
                if let Some(description) = &changes.description {
                    project.description = Some(description.clone());
                }
                if let Some(start_date) = changes.start_date {
                    project.start_date = start_date;
                }
                if let Some(end_date) = changes.end_date {
                    project.end_date = end_date;
                }
                if project.end_date < project.start_date {
                    return Err(ApiError::bad_request("End date must be after start date"));
                }
                if let Some(budget) = changes.budget {
                    if budget < 0.0 {
                        return Err(ApiError::bad_request("Budget cannot be negative"));
                    }
                    project.budget = budget;
                }
                if let Some(status) = changes.status {
                    project.status = status;
                }
                project.updated_at = Utc::now();
                Ok(project.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        self.activity().record(
            id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::ProjectUpdated,
                entity_type: EntityType::Project,
                entity_id: id,
                details: ActivityDetails {
                    new_value: serde_json::to_value(&changes).ok(),
                    ..Default::default()
                }
                .with_description("Project details updated"),
            },
        );
        Ok(project)
    }

    pub fn add_team_member(&self, id: Uuid, user_id: Uuid, actor: &AuthUser) -> ApiResult<Project> {
        if self.data.get::<User>(user_id)?.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        let project = self
            .data
            .modify(id, |project: &mut Project| -> ApiResult<Project> {
                ensure_can_manage(project, actor)?;
                if project.team.contains(&user_id) {
                    return Err(ApiError::bad_request("User is already a team member"));
                }
                project.team.push(user_id);
                project.updated_at = Utc::now();
                Ok(project.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        self.activity().record(
            id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::TeamMemberAdded,
                entity_type: EntityType::Project,
                entity_id: id,
                details: ActivityDetails::describe("Team member added")
                    .with_metadata(json!({ "memberId": user_id })),
            },
        );
        self.notifications().notify(NewNotification {
            recipient_id: user_id,
            message: format!("You have been added to project: {}", project.name),
            kind: NotificationType::Assignment,
            related: Some(RelatedRef::project(id)),
        });
        Ok(project)
    }

    pub fn get_dashboard_stats(&self, actor: &AuthUser) -> ApiResult<DashboardStatsResponse> {
        let projects = self.get_all_projects(actor)?;
        let visible: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let tasks: Vec<Task> = self
            .data
            .scan::<Task>()?
            .into_iter()
            .filter(|t| match actor.role {
                Role::Developer => t.is_assigned_to(actor.user_id),
                _ => visible.contains(&t.project_id),
            })
            .collect();

        let now = Utc::now();
        Ok(DashboardStatsResponse {
            total_projects: projects.len(),
            active_projects: projects.iter().filter(|p| p.status == TaskStatus::InProgress).count(),
            completed_projects: projects.iter().filter(|p| p.status == TaskStatus::Completed).count(),
            total_tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Completed).count(),
            overdue_tasks: tasks
                .iter()
                .filter(|t| t.status != TaskStatus::Completed && t.deadline < now)
                .count(),
            total_time_logged: tasks.iter().map(|t| t.time_logged).sum(),
        })
    }

    /// Recomputes project progress and every milestone's progress from the
    /// current task statuses.
    pub fn refresh_progress(&self, project_id: Uuid) -> ApiResult<()> {
        let statuses: HashMap<Uuid, TaskStatus> = self
            .data
            .scan::<Task>()?
            .into_iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| (t.id, t.status))
            .collect();

        self.data
            .modify(project_id, |project: &mut Project| -> ApiResult<()> {
                let done = statuses.values().filter(|s| **s == TaskStatus::Completed).count();
                project.progress = percent_complete(done, statuses.len());
                for milestone in &mut project.milestones {
                    let done = milestone
                        .tasks
                        .iter()
                        .filter(|id| statuses.get(*id) == Some(&TaskStatus::Completed))
                        .count();
                    milestone.progress = percent_complete(done, milestone.tasks.len());
                }
                Ok(())
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    pub fn refresh_progress_or_warn(&self, project_id: Uuid) {
        if let Err(e) = self.refresh_progress(project_id) {
            warn!(%project_id, error = %e, "failed to refresh project progress");
        }
    }

    /// Moves `task_id` out of `from` and into `to` in the milestone task lists.
    pub fn move_task_between_milestones(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        from: Option<Uuid>,
        to: Option<Uuid>,
    ) -> ApiResult<()> {
        self.data
            .modify(project_id, |project: &mut Project| -> ApiResult<()> {
                if let Some(id) = from {
                    if let Some(milestone) = project.milestone_mut(id) {
                        milestone.tasks.retain(|t| *t != task_id);
                    }
                }
                if let Some(id) = to {
                    if let Some(milestone) = project.milestone_mut(id) {
                        if !milestone.tasks.contains(&task_id) {
                            milestone.tasks.push(task_id);
                        }
                    }
                }
                Ok(())
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    // MILESTONES
    pub fn add_milestone(&self, project_id: Uuid, request: CreateMilestoneRequest, actor: &AuthUser) -> ApiResult<Milestone> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Milestone name is required"));
        }

        let milestone = self
            .data
            .modify(project_id, |project: &mut Project| -> ApiResult<Milestone> {
                ensure_can_manage(project, actor)?;
                let milestone = Milestone {
                    id: Uuid::new_v4(),
                    name,
                    description: request.description,
                    due_date: request.due_date,
                    status: TaskStatus::NotStarted,
                    progress: 0,
                    tasks: vec![],
                    created_at: Utc::now(),
                };
                project.milestones.push(milestone.clone());
                project.updated_at = Utc::now();
                Ok(milestone)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        self.activity().record(
            project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::MilestoneCreated,
                entity_type: EntityType::Milestone,
                entity_id: milestone.id,
                details: ActivityDetails::describe(format!("Milestone \"{}\" created", milestone.name)),
            },
        );
        Ok(milestone)
    }

    pub fn list_milestones(&self, project_id: Uuid) -> ApiResult<Vec<Milestone>> {
        Ok(self.load(project_id)?.milestones)
    }

    pub fn update_milestone(
        &self,
        project_id: Uuid,
        milestone_id: Uuid,
        changes: UpdateMilestoneRequest,
        actor: &AuthUser,
    ) -> ApiResult<Milestone> {
        let milestone = self
            .data
            .modify(project_id, |project: &mut Project| -> ApiResult<Milestone> {
                ensure_can_manage(project, actor)?;
                let milestone = project
                    .milestone_mut(milestone_id)
                    .ok_or_else(|| ApiError::not_found("Milestone not found"))?;
                if let Some(name) = changes.name.as_deref() {
                    if name.trim().is_empty() {
                        return Err(ApiError::bad_request("Milestone name is required"));
                    }
                    milestone.name = name.trim().to_string();
                }
                if let Some(description) = &changes.description {
                    milestone.description = Some(description.clone());
                }
                if let Some(due_date) = changes.due_date {
                    milestone.due_date = due_date;
                }
                if let Some(status) = changes.status {
                    milestone.status = status;
                }
                let milestone = milestone.clone();
                project.updated_at = Utc::now();
                Ok(milestone)
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        self.activity().record(
            project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::MilestoneUpdated,
                entity_type: EntityType::Milestone,
                entity_id: milestone_id,
                details: ActivityDetails {
                    new_value: serde_json::to_value(&changes).ok(),
                    ..Default::default()
                },
            },
        );
        Ok(milestone)
    }

    /// Removes the milestone and detaches its tasks.
    pub fn delete_milestone(&self, project_id: Uuid, milestone_id: Uuid, actor: &AuthUser) -> ApiResult<()> {
        let removed = self
            .data
            .modify(project_id, |project: &mut Project| -> ApiResult<Milestone> {
                ensure_can_manage(project, actor)?;
                let index = project
                    .milestones
                    .iter()
                    .position(|m| m.id == milestone_id)
                    .ok_or_else(|| ApiError::not_found("Milestone not found"))?;
                project.updated_at = Utc::now();
                Ok(project.milestones.remove(index))
            })?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        for task_id in &removed.tasks {
            let detached = self.data.modify(*task_id, |task: &mut Task| -> ApiResult<()> {
                if task.milestone_id == Some(milestone_id) {
                    task.milestone_id = None;
                    task.updated_at = Utc::now();
                }
                Ok(())
            });
            if let Err(e) = detached {
                warn!(%task_id, %milestone_id, error = %e, "failed to detach task from deleted milestone");
            }
        }

        self.activity().record(
            project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::MilestoneUpdated,
                entity_type: EntityType::Milestone,
                entity_id: milestone_id,
                details: ActivityDetails::describe(format!("Milestone \"{}\" deleted", removed.name)),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::data_context::tests::{seed_project, seed_task, seed_user, temp_db};
    use chrono::Duration;

    fn actor(user: &User) -> AuthUser {
        AuthUser { user_id: user.id, role: user.role }
    }

    #[test]
    fn visibility_follows_role() {
        let db = temp_db("project_visibility");
        let service = ProjectService::new(&db.data);
        let admin = seed_user(&db.data, Role::SuperAdmin, None);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let dev = seed_user(&db.data, Role::Developer, None);

        let now = Utc::now();
        let project = service
            .create_project(
                CreateProjectRequest {
                    name: " Apollo ".into(),
                    description: None,
                    start_date: now,
                    end_date: now + Duration::days(10),
                    budget: 50.0,
                    team: vec![dev.id, dev.id],
                },
                &actor(&manager),
            )
            .unwrap();
        assert_eq!(project.name, "Apollo");
        assert_eq!(project.team, vec![dev.id]);
        seed_project(&db.data, Uuid::new_v4());

        assert_eq!(service.get_all_projects(&actor(&admin)).unwrap().len(), 2);
        assert_eq!(service.get_all_projects(&actor(&manager)).unwrap().len(), 1);
        assert_eq!(service.get_all_projects(&actor(&dev)).unwrap().len(), 1);
    }

    #[test]
    fn rejects_inverted_dates() {
        let db = temp_db("project_dates");
        let service = ProjectService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let now = Utc::now();
        let result = service.create_project(
            CreateProjectRequest {
                name: "Late".into(),
                description: None,
                start_date: now,
                end_date: now - Duration::days(1),
                budget: 0.0,
                team: vec![],
            },
            &actor(&manager),
        );
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn only_the_manager_updates_and_each_update_is_logged() {
        let db = temp_db("project_update");
        let service = ProjectService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let other = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);

        let changes = UpdateProjectRequest { budget: Some(10.0), ..Default::default() };
        assert!(matches!(
            service.update_project(project.id, changes.clone(), &actor(&other)),
            Err(ApiError::Forbidden(_))
        ));

        let updated = service.update_project(project.id, changes, &actor(&manager)).unwrap();
        assert_eq!(updated.budget, 10.0);
        let stored = db.data.get::<Project>(project.id).unwrap().unwrap();
        assert_eq!(stored.activity_log.len(), 1);
        assert_eq!(stored.activity_log[0].action, ActivityAction::ProjectUpdated);
    }

    #[test]
    fn adding_a_team_member_twice_fails() {
        let db = temp_db("project_team");
        let service = ProjectService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let dev = seed_user(&db.data, Role::Developer, None);
        let project = seed_project(&db.data, manager.id);

        service.add_team_member(project.id, dev.id, &actor(&manager)).unwrap();
        assert!(matches!(
            service.add_team_member(project.id, dev.id, &actor(&manager)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.add_team_member(project.id, Uuid::new_v4(), &actor(&manager)),
            Err(ApiError::NotFound(_))
        ));
        let unread = NotificationService::new(&db.data).get_unread_count(dev.id).unwrap();
        assert_eq!(unread, 1);
    }

    #[test]
    fn progress_counts_completed_tasks() {
        let db = temp_db("project_progress");
        let service = ProjectService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let done = seed_task(&db.data, project.id, "a", TaskStatus::Completed, vec![]);
        let open = seed_task(&db.data, project.id, "b", TaskStatus::InProgress, vec![]);
        seed_task(&db.data, project.id, "c", TaskStatus::NotStarted, vec![]);
        seed_task(&db.data, project.id, "d", TaskStatus::Completed, vec![]);

        let milestone = service
            .add_milestone(
                project.id,
                CreateMilestoneRequest { name: "M1".into(), description: None, due_date: Utc::now() },
                &actor(&manager),
            )
            .unwrap();
        service
            .move_task_between_milestones(project.id, done.id, None, Some(milestone.id))
            .unwrap();
        service
            .move_task_between_milestones(project.id, open.id, None, Some(milestone.id))
            .unwrap();

        service.refresh_progress(project.id).unwrap();
        let stored = db.data.get::<Project>(project.id).unwrap().unwrap();
        assert_eq!(stored.progress, 50);
        assert_eq!(stored.milestones[0].progress, 50);
    }

    #[test]
    fn deleting_a_milestone_detaches_tasks() {
        let db = temp_db("milestone_delete");
        let service = ProjectService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let milestone = service
            .add_milestone(
                project.id,
                CreateMilestoneRequest { name: "M1".into(), description: None, due_date: Utc::now() },
                &actor(&manager),
            )
            .unwrap();
        let task = seed_task(&db.data, project.id, "a", TaskStatus::NotStarted, vec![]);
        db.data
            .modify(task.id, |t: &mut Task| -> ApiResult<()> {
                t.milestone_id = Some(milestone.id);
                Ok(())
            })
            .unwrap();
        service
            .move_task_between_milestones(project.id, task.id, None, Some(milestone.id))
            .unwrap();

        service.delete_milestone(project.id, milestone.id, &actor(&manager)).unwrap();
        assert!(service.list_milestones(project.id).unwrap().is_empty());
        assert!(db.data.get::<Task>(task.id).unwrap().unwrap().milestone_id.is_none());
        assert!(matches!(
            service.delete_milestone(project.id, milestone.id, &actor(&manager)),
            Err(ApiError::NotFound(_))
        ));
    }
}
