use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    authentication::auth::AuthUser,
    create_feedback_request::CreateFeedbackRequest,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    feedback::Feedback,
    feedback_view::FeedbackView,
    project::Project,
    user::User,
};

/// Free-form project reviews. Unlike ratings these are not unique and do not
/// feed profile aggregates.
pub struct FeedbackService<'a> {
    data: &'a DataContext,
}

impl<'a> FeedbackService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn create_feedback(&self, request: CreateFeedbackRequest, actor: &AuthUser) -> ApiResult<Feedback> {
        if !(1..=5).contains(&request.rating) {
            return Err(ApiError::bad_request("Rating must be between 1 and 5"));
        }
        if self.data.get::<Project>(request.project_id)?.is_none() {
            return Err(ApiError::not_found("Project not found"));
        }
        if self.data.get::<User>(request.reviewee_id)?.is_none() {
            return Err(ApiError::not_found("Reviewee not found"));
        }

        let feedback = Feedback {
            id: Uuid::new_v4(),
            reviewer_id: actor.user_id,
            reviewee_id: request.reviewee_id,
            project_id: request.project_id,
            task_id: request.task_id,
            rating: request.rating,
            comment: request.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        };
        self.data.put(&feedback)?;
        info!(feedback_id = %feedback.id, project_id = %feedback.project_id, "feedback created");
        Ok(feedback)
    }

    pub fn list_by_project(&self, project_id: Uuid) -> ApiResult<Vec<FeedbackView>> {
        let mut feedbacks: Vec<Feedback> = self
            .data
            .scan::<Feedback>()?
            .into_iter()
            .filter(|f| f.project_id == project_id)
            .collect();
        feedbacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let names = self
            .data
            .display_names(feedbacks.iter().flat_map(|f| [f.reviewer_id, f.reviewee_id]))?;
        let name_of = |id: &Uuid| names.get(id).cloned().unwrap_or_default();
        Ok(feedbacks
            .into_iter()
            .map(|feedback| FeedbackView {
                reviewer_name: name_of(&feedback.reviewer_id),
                reviewee_name: name_of(&feedback.reviewee_id),
                feedback,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_access::data_context::tests::{seed_project, seed_user, temp_db},
        role::Role,
    };

    fn request(project_id: Uuid, reviewee_id: Uuid, rating: u8) -> CreateFeedbackRequest {
        CreateFeedbackRequest {
            reviewee_id,
            project_id,
            task_id: None,
            rating,
            comment: Some("  Solid work ".into()),
        }
    }

    #[test]
    fn feedback_is_listed_with_names() {
        let db = temp_db("feedback");
        let service = FeedbackService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, Some("Morgan"));
        let dev = seed_user(&db.data, Role::Developer, Some("Devi"));
        let project = seed_project(&db.data, manager.id);
        let actor = AuthUser { user_id: manager.id, role: manager.role };

        let feedback = service.create_feedback(request(project.id, dev.id, 4), &actor).unwrap();
        assert_eq!(feedback.comment.as_deref(), Some("Solid work"));

        let views = service.list_by_project(project.id).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].reviewer_name, "Morgan");
        assert_eq!(views[0].reviewee_name, "Devi");
        assert!(service.list_by_project(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn invalid_feedback_is_rejected() {
        let db = temp_db("feedback_invalid");
        let service = FeedbackService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let actor = AuthUser { user_id: manager.id, role: manager.role };

        assert!(matches!(
            service.create_feedback(request(project.id, manager.id, 6), &actor),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.create_feedback(request(Uuid::new_v4(), manager.id, 3), &actor),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.create_feedback(request(project.id, Uuid::new_v4(), 3), &actor),
            Err(ApiError::NotFound(_))
        ));
    }
}
