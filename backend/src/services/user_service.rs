use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    platform_analytics_response::PlatformAnalyticsResponse,
    project::Project,
    rating::Rating,
    role::Role,
    subscription::{Subscription, SubscriptionStatus},
    task::Task,
    task_status::TaskStatus,
    user::User,
    user_get_response::UserGetResponse,
};

/// Administrative user management. Callers are expected to be super admins.
pub struct UserService<'a> {
    data: &'a DataContext,
}

impl<'a> UserService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn list_users(&self) -> ApiResult<Vec<UserGetResponse>> {
        let mut users = self.data.scan::<User>()?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let names = self.data.display_names(users.iter().map(|u| u.id))?;
        Ok(users
            .iter()
            .map(|u| u.to_get_dto(names.get(&u.id).cloned().unwrap_or_default()))
            .collect())
    }

    pub fn get_user(&self, id: Uuid) -> ApiResult<UserGetResponse> {
        let user = self
            .data
            .get::<User>(id)?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.to_get_dto(self.data.display_name(id)?))
    }

    fn change(
        &self,
        actor_id: Uuid,
        id: Uuid,
        apply: impl FnOnce(&mut User),
    ) -> ApiResult<UserGetResponse> {
        if actor_id == id {
            return Err(ApiError::bad_request("You cannot change your own account status or role"));
        }
        let user = self
            .data
            .modify(id, |user: &mut User| -> ApiResult<User> {
                apply(user);
                user.updated_at = Utc::now();
                Ok(user.clone())
            })?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.to_get_dto(self.data.display_name(id)?))
    }

    pub fn update_role(&self, actor_id: Uuid, id: Uuid, role: Role) -> ApiResult<UserGetResponse> {
        let user = self.change(actor_id, id, |user| user.role = role)?;
        info!(user_id = %id, %role, "role updated");
        Ok(user)
    }

    pub fn set_active(&self, actor_id: Uuid, id: Uuid, is_active: bool) -> ApiResult<UserGetResponse> {
        let user = self.change(actor_id, id, |user| user.is_active = is_active)?;
        info!(user_id = %id, is_active, "activation changed");
        Ok(user)
    }

    pub fn set_blocked(&self, actor_id: Uuid, id: Uuid, is_blocked: bool) -> ApiResult<UserGetResponse> {
        let user = self.change(actor_id, id, |user| user.is_blocked = is_blocked)?;
        info!(user_id = %id, is_blocked, "block state changed");
        Ok(user)
    }

    pub fn platform_analytics(&self) -> ApiResult<PlatformAnalyticsResponse> {
        let mut analytics = PlatformAnalyticsResponse::default();

        for user in self.data.scan::<User>()? {
            analytics.total_users += 1;
            if user.is_blocked {
                analytics.blocked_users += 1;
            }
            match user.role {
                Role::SuperAdmin => analytics.users_by_role.super_admin += 1,
                Role::ProjectManager => analytics.users_by_role.project_manager += 1,
                Role::Developer => analytics.users_by_role.developer += 1,
            }
        }
        for task in self.data.scan::<Task>()? {
            match task.status {
                TaskStatus::NotStarted => analytics.tasks_by_status.not_started += 1,
                TaskStatus::InProgress => analytics.tasks_by_status.in_progress += 1,
                TaskStatus::Completed => analytics.tasks_by_status.completed += 1,
            }
        }
        analytics.total_projects = self.data.scan::<Project>()?.len();
        analytics.total_ratings = self.data.scan::<Rating>()?.len();
        analytics.active_subscriptions = self
            .data
            .scan::<Subscription>()?
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .count();
        Ok(analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::data_context::tests::{seed_project, seed_task, seed_user, temp_db};

    #[test]
    fn admins_manage_other_accounts_only() {
        let db = temp_db("user_admin");
        let service = UserService::new(&db.data);
        let admin = seed_user(&db.data, Role::SuperAdmin, Some("Root"));
        let dev = seed_user(&db.data, Role::Developer, Some("Dev"));

        let promoted = service.update_role(admin.id, dev.id, Role::ProjectManager).unwrap();
        assert_eq!(promoted.role, Role::ProjectManager);
        assert_eq!(promoted.name, "Dev");

        assert!(service.set_blocked(admin.id, dev.id, true).unwrap().is_blocked);
        assert!(!service.set_active(admin.id, dev.id, false).unwrap().is_active);
        assert!(matches!(
            service.set_blocked(admin.id, admin.id, true),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.update_role(admin.id, Uuid::new_v4(), Role::Developer),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn analytics_count_everything() {
        let db = temp_db("user_analytics");
        let service = UserService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        seed_user(&db.data, Role::Developer, None);
        seed_user(&db.data, Role::Developer, None);
        let project = seed_project(&db.data, manager.id);
        seed_task(&db.data, project.id, "a", TaskStatus::Completed, vec![]);
        seed_task(&db.data, project.id, "b", TaskStatus::NotStarted, vec![]);

        let analytics = service.platform_analytics().unwrap();
        assert_eq!(analytics.total_users, 3);
        assert_eq!(analytics.users_by_role.developer, 2);
        assert_eq!(analytics.total_projects, 1);
        assert_eq!(analytics.tasks_by_status.completed, 1);
        assert_eq!(analytics.tasks_by_status.not_started, 1);
        assert_eq!(service.list_users().unwrap().len(), 3);
    }
}
