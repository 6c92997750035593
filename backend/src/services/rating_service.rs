use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    create_rating_request::CreateRatingRequest,
    data_access::{
        data_context::DataContext,
        lookups::{ProjectLookup, TaskLookup},
    },
    error::{ApiError, ApiResult},
    page_query::PageQuery,
    profile::{Profile, RatingsBreakdown},
    rating::{RatedEntityType, Rating, RelatedEntity, MAX_COMMENT_LEN},
    rating_view::{AverageRatingResponse, RatingPage, RatingView, RatingsBreakdownResponse},
    task_status::TaskStatus,
    user::User,
};

const DEFAULT_RATINGS_LIMIT: usize = 50;

/// Aggregates for one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: u32,
    pub ratings_breakdown: RatingsBreakdown,
}

/// Mean rounded to one decimal, total and per-star counts.
pub fn summarize<'r>(ratings: impl IntoIterator<Item = &'r Rating>) -> RatingSummary {
    let mut breakdown = RatingsBreakdown::default();
    let mut total = 0u32;
    let mut sum = 0u64;
    for rating in ratings {
        breakdown.record(rating.rating);
        total += 1;
        sum += u64::from(rating.rating);
    }
    let average_rating = if total == 0 {
        0.0
    } else {
        ((sum as f64 / f64::from(total)) * 10.0).round() / 10.0
    };
    RatingSummary {
        average_rating,
        total_ratings: total,
        ratings_breakdown: breakdown,
    }
}

pub struct RatingService<'a> {
    data: &'a DataContext,
    tasks: &'a dyn TaskLookup,
    projects: &'a dyn ProjectLookup,
}

impl<'a> RatingService<'a> {
    pub fn new(data: &'a DataContext, tasks: &'a dyn TaskLookup, projects: &'a dyn ProjectLookup) -> Self {
        Self { data, tasks, projects }
    }

    fn received_by(&self, user_id: Uuid) -> ApiResult<Vec<Rating>> {
        Ok(self
            .data
            .scan::<Rating>()?
            .into_iter()
            .filter(|r| r.to_user_id == user_id)
            .collect())
    }

    fn ensure_entity_completed(&self, entity: RelatedEntity) -> ApiResult<()> {
        let status = match entity.entity_type {
            RatedEntityType::Task => self
                .tasks
                .find_task(entity.entity_id)?
                .ok_or_else(|| ApiError::not_found("Task not found"))?
                .status,
            RatedEntityType::Project => self
                .projects
                .find_project(entity.entity_id)?
                .ok_or_else(|| ApiError::not_found("Project not found"))?
                .status,
        };
        if status != TaskStatus::Completed {
            return Err(ApiError::bad_request(format!(
                "Can only rate completed {}s",
                entity.entity_type
            )));
        }
        Ok(())
    }

    pub fn create_rating(&self, from_user_id: Uuid, request: CreateRatingRequest) -> ApiResult<Rating> {
        if from_user_id == request.to_user_id {
            return Err(ApiError::bad_request("Cannot rate yourself"));
        }
        if !(1..=5).contains(&request.rating) {
            return Err(ApiError::bad_request("Rating must be between 1 and 5"));
        }
        let comment = request
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
            return Err(ApiError::bad_request(format!(
                "Comment cannot exceed {MAX_COMMENT_LEN} characters"
            )));
        }

        let entity = RelatedEntity {
            entity_type: request.entity_type,
            entity_id: request.entity_id,
        };
        self.ensure_entity_completed(entity)?;
        if self.data.get::<User>(request.to_user_id)?.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        let rating = Rating {
            id: Uuid::new_v4(),
            from_user_id,
            to_user_id: request.to_user_id,
            related_entity: entity,
            rating: request.rating,
            comment,
            created_at: Utc::now(),
        };
        if !self.data.create_rating(&rating)? {
            return Err(ApiError::bad_request(format!(
                "You have already rated this {}",
                entity.entity_type
            )));
        }
        info!(rating_id = %rating.id, to_user_id = %rating.to_user_id, stars = rating.rating, "rating created");

        if let Err(e) = self.update_profile_rating(rating.to_user_id) {
            warn!(user_id = %rating.to_user_id, error = %e, "failed to refresh profile rating");
        }
        Ok(rating)
    }

    /// Rescans every rating the user received and stores the aggregates on
    /// their profile. The read and the profile write are separate storage
    /// operations, so two concurrent ratings can race here.
    pub fn update_profile_rating(&self, user_id: Uuid) -> ApiResult<()> {
        let summary = summarize(&self.received_by(user_id)?);
        let Some(profile) = self.data.get_profile_by_auth(user_id)? else {
            warn!(%user_id, "rated user has no profile, aggregates not stored");
            return Ok(());
        };

        self.data.modify(profile.id, |profile: &mut Profile| -> ApiResult<()> {
            profile.average_rating = summary.average_rating;
            profile.total_ratings = summary.total_ratings;
            profile.ratings_breakdown = summary.ratings_breakdown;
            profile.updated_at = Utc::now();
            Ok(())
        })?;
        Ok(())
    }

    /// Newest first, joined with the rater's display name.
    pub fn get_user_ratings(&self, user_id: Uuid, page: PageQuery) -> ApiResult<RatingPage> {
        let mut ratings = self.received_by(user_id)?;
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = ratings.len();

        let ratings: Vec<Rating> = ratings
            .into_iter()
            .skip(page.skip.unwrap_or(0))
            .take(page.limit.unwrap_or(DEFAULT_RATINGS_LIMIT))
            .collect();
        let names = self.data.display_names(ratings.iter().map(|r| r.from_user_id))?;
        let ratings = ratings
            .into_iter()
            .map(|rating| RatingView {
                from_user_name: names.get(&rating.from_user_id).cloned().unwrap_or_default(),
                rating,
            })
            .collect();
        Ok(RatingPage { ratings, total })
    }

    pub fn get_ratings_given_by_user(&self, user_id: Uuid) -> ApiResult<Vec<Rating>> {
        let mut ratings: Vec<Rating> = self
            .data
            .scan::<Rating>()?
            .into_iter()
            .filter(|r| r.from_user_id == user_id)
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    pub fn has_user_rated(&self, from_user_id: Uuid, entity: RelatedEntity) -> ApiResult<bool> {
        Ok(self
            .data
            .rating_key_exists(&Rating::uniqueness_key(from_user_id, entity))?)
    }

    pub fn get_average_rating(&self, user_id: Uuid) -> ApiResult<AverageRatingResponse> {
        let summary = summarize(&self.received_by(user_id)?);
        Ok(AverageRatingResponse {
            average_rating: summary.average_rating,
            total_ratings: summary.total_ratings,
        })
    }

    pub fn get_ratings_breakdown(&self, user_id: Uuid) -> ApiResult<RatingsBreakdownResponse> {
        let summary = summarize(&self.received_by(user_id)?);
        Ok(RatingsBreakdownResponse {
            ratings_breakdown: summary.ratings_breakdown,
            total_ratings: summary.total_ratings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_access::data_context::{
            tests::{seed_project, seed_task, seed_user, temp_db},
            DataError,
        },
        project::Project,
        role::Role,
        task::Task,
    };
    use std::collections::HashMap;

    /// In-memory lookups so the rating rules can be tested without the task module.
    #[derive(Default)]
    struct Fixtures {
        tasks: HashMap<Uuid, Task>,
        projects: HashMap<Uuid, Project>,
    }

    impl TaskLookup for Fixtures {
        fn find_task(&self, id: Uuid) -> Result<Option<Task>, DataError> {
            Ok(self.tasks.get(&id).cloned())
        }
    }

    impl ProjectLookup for Fixtures {
        fn find_project(&self, id: Uuid) -> Result<Option<Project>, DataError> {
            Ok(self.projects.get(&id).cloned())
        }
    }

    fn rate(to_user_id: Uuid, entity_id: Uuid, stars: u8) -> CreateRatingRequest {
        CreateRatingRequest {
            to_user_id,
            entity_type: RatedEntityType::Task,
            entity_id,
            rating: stars,
            comment: None,
        }
    }

    #[test]
    fn summary_rounds_to_one_decimal() {
        let make = |stars| Rating {
            id: Uuid::new_v4(),
            from_user_id: Uuid::new_v4(),
            to_user_id: Uuid::new_v4(),
            related_entity: RelatedEntity { entity_type: RatedEntityType::Task, entity_id: Uuid::new_v4() },
            rating: stars,
            comment: None,
            created_at: Utc::now(),
        };
        let ratings = vec![make(5), make(4), make(4)];
        let summary = summarize(&ratings);
        assert_eq!(summary.average_rating, 4.3);
        assert_eq!(summary.total_ratings, 3);
        assert_eq!(summary.ratings_breakdown.count(4), 2);
        assert_eq!(summary.ratings_breakdown.count(5), 1);
        assert_eq!(summarize(&Vec::<Rating>::new()).average_rating, 0.0);
    }

    #[test]
    fn ratings_update_recipient_profile() {
        let db = temp_db("rating_profile");
        let dev = seed_user(&db.data, Role::Developer, Some("Linus"));
        let raters: Vec<User> = (0..3).map(|_| seed_user(&db.data, Role::ProjectManager, None)).collect();
        let project = seed_project(&db.data, raters[0].id);
        let task = seed_task(&db.data, project.id, "Done", TaskStatus::Completed, vec![]);
        let mut fixtures = Fixtures::default();
        fixtures.tasks.insert(task.id, task.clone());
        let service = RatingService::new(&db.data, &fixtures, &fixtures);

        for (rater, stars) in raters.iter().zip([5, 4, 4]) {
            service.create_rating(rater.id, rate(dev.id, task.id, stars)).unwrap();
        }

        let profile = db.data.get_profile_by_auth(dev.id).unwrap().unwrap();
        assert_eq!(profile.average_rating, 4.3);
        assert_eq!(profile.total_ratings, 3);
        assert_eq!(profile.ratings_breakdown.count(4), 2);
        assert_eq!(profile.ratings_breakdown.count(5), 1);

        let page = service.get_user_ratings(dev.id, PageQuery { limit: Some(2), skip: None }).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.ratings.len(), 2);
        assert_eq!(page.ratings[0].from_user_name, "Unknown");
        assert_eq!(service.get_ratings_given_by_user(raters[0].id).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_and_self_ratings_fail() {
        let db = temp_db("rating_rules");
        let dev = seed_user(&db.data, Role::Developer, Some("Linus"));
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "Done", TaskStatus::Completed, vec![]);
        let mut fixtures = Fixtures::default();
        fixtures.tasks.insert(task.id, task.clone());
        let service = RatingService::new(&db.data, &fixtures, &fixtures);

        let own = service.create_rating(dev.id, rate(dev.id, task.id, 5));
        assert!(matches!(own, Err(ApiError::BadRequest(_))));

        service.create_rating(manager.id, rate(dev.id, task.id, 5)).unwrap();
        let again = service.create_rating(manager.id, rate(dev.id, task.id, 1));
        let Err(ApiError::BadRequest(message)) = again else { panic!("duplicate accepted") };
        assert_eq!(message, "You have already rated this task");

        let entity = RelatedEntity { entity_type: RatedEntityType::Task, entity_id: task.id };
        assert!(service.has_user_rated(manager.id, entity).unwrap());
        assert!(!service.has_user_rated(dev.id, entity).unwrap());
        assert_eq!(service.get_average_rating(dev.id).unwrap().average_rating, 5.0);
    }

    #[test]
    fn entity_must_exist_and_be_completed() {
        let db = temp_db("rating_entity");
        let dev = seed_user(&db.data, Role::Developer, None);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let open = seed_task(&db.data, project.id, "Open", TaskStatus::InProgress, vec![]);
        let mut fixtures = Fixtures::default();
        fixtures.tasks.insert(open.id, open.clone());
        fixtures.projects.insert(project.id, project.clone());
        let service = RatingService::new(&db.data, &fixtures, &fixtures);

        let missing = service.create_rating(manager.id, rate(dev.id, Uuid::new_v4(), 4));
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
        let unfinished = service.create_rating(manager.id, rate(dev.id, open.id, 4));
        assert!(matches!(unfinished, Err(ApiError::BadRequest(_))));

        let on_project = CreateRatingRequest {
            entity_type: RatedEntityType::Project,
            entity_id: project.id,
            ..rate(dev.id, project.id, 4)
        };
        assert!(matches!(service.create_rating(manager.id, on_project), Err(ApiError::BadRequest(_))));

        let out_of_range = service.create_rating(manager.id, rate(dev.id, open.id, 6));
        assert!(matches!(out_of_range, Err(ApiError::BadRequest(_))));
        let long = CreateRatingRequest { comment: Some("x".repeat(501)), ..rate(dev.id, open.id, 3) };
        assert!(matches!(service.create_rating(manager.id, long), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn unprofiled_recipient_still_gets_the_rating() {
        let db = temp_db("rating_no_profile");
        let dev = seed_user(&db.data, Role::Developer, None);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "Done", TaskStatus::Completed, vec![]);
        let task_id = task.id;
        let mut fixtures = Fixtures::default();
        fixtures.tasks.insert(task_id, task);
        let service = RatingService::new(&db.data, &fixtures, &fixtures);

        let rating = service.create_rating(manager.id, rate(dev.id, task_id, 3));
        assert!(rating.is_ok());
        assert_eq!(service.get_ratings_breakdown(dev.id).unwrap().ratings_breakdown.count(3), 1);
    }
}
