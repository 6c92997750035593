use tracing::info;
use uuid::Uuid;

use crate::{
    create_profile_request::CreateProfileRequest,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    profile::Profile,
    profile_search_query::ProfileSearchQuery,
    update_profile_request::UpdateProfileRequest,
};

const DEFAULT_SEARCH_LIMIT: usize = 20;

pub struct ProfileService<'a> {
    data: &'a DataContext,
}

impl<'a> ProfileService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn create_profile(&self, user_id: Uuid, request: CreateProfileRequest) -> ApiResult<Profile> {
        if request.name.trim().is_empty() {
            return Err(ApiError::bad_request("Name is required"));
        }
        let profile = Profile::new(user_id, request);
        if !self.data.create_profile(&profile)? {
            return Err(ApiError::bad_request("Profile already exists"));
        }
        info!(profile_id = %profile.id, %user_id, "profile created");
        Ok(profile)
    }

    pub fn get_my_profile(&self, user_id: Uuid) -> ApiResult<Profile> {
        self.data
            .get_profile_by_auth(user_id)?
            .ok_or_else(|| ApiError::not_found("Profile not found"))
    }

    /// Accepts either a profile id or the owning user's id.
    pub fn get_public_profile(&self, id: Uuid) -> ApiResult<Profile> {
        if let Some(profile) = self.data.get::<Profile>(id)? {
            return Ok(profile);
        }
        self.get_my_profile(id)
    }

    pub fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> ApiResult<Profile> {
        if request.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
        let profile = self.get_my_profile(user_id)?;
        self.data
            .modify(profile.id, |profile: &mut Profile| -> ApiResult<Profile> {
                profile.edit(request);
                Ok(profile.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Profile not found"))
    }

    /// Case-insensitive substring match on name and skills, best rated first.
    pub fn search_profiles(&self, query: &ProfileSearchQuery) -> ApiResult<Vec<Profile>> {
        let text = query.q.as_deref().map(str::to_lowercase);
        let skill = query.skill.as_deref().map(str::to_lowercase);

        let mut profiles: Vec<Profile> = self
            .data
            .scan::<Profile>()?
            .into_iter()
            .filter(|p| {
                text.as_deref().map_or(true, |text| {
                    p.name.to_lowercase().contains(text)
                        || p.skill.iter().any(|s| s.to_lowercase().contains(text))
                })
            })
            .filter(|p| {
                skill
                    .as_deref()
                    .map_or(true, |skill| p.skill.iter().any(|s| s.to_lowercase().contains(skill)))
            })
            .collect();
        profiles.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| a.name.cmp(&b.name))
        });
        profiles.truncate(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::data_context::tests::temp_db;

    fn request(name: &str, skill: &[&str]) -> CreateProfileRequest {
        CreateProfileRequest {
            name: name.into(),
            image_url: None,
            phone_number: None,
            skill: skill.iter().map(|s| s.to_string()).collect(),
            bio: None,
            address: None,
        }
    }

    #[test]
    fn one_profile_per_user_and_lookup_by_either_id() {
        let db = temp_db("profile_service");
        let service = ProfileService::new(&db.data);
        let user_id = Uuid::new_v4();

        let profile = service.create_profile(user_id, request("Ada", &["rust"])).unwrap();
        assert!(matches!(
            service.create_profile(user_id, request("Ada again", &[])),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(service.get_public_profile(profile.id).unwrap().id, profile.id);
        assert_eq!(service.get_public_profile(user_id).unwrap().id, profile.id);
        assert!(matches!(service.get_public_profile(Uuid::new_v4()), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn update_keeps_rating_fields() {
        let db = temp_db("profile_update");
        let service = ProfileService::new(&db.data);
        let user_id = Uuid::new_v4();
        service.create_profile(user_id, request("Ada", &[])).unwrap();

        let updated = service
            .update_profile(
                user_id,
                UpdateProfileRequest { bio: Some("Engines".into()), ..Default::default() },
            )
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Engines"));
        assert_eq!(updated.total_ratings, 0);
        assert!(service
            .update_profile(user_id, UpdateProfileRequest { name: Some(" ".into()), ..Default::default() })
            .is_err());
    }

    #[test]
    fn search_matches_name_and_skill() {
        let db = temp_db("profile_search");
        let service = ProfileService::new(&db.data);
        service.create_profile(Uuid::new_v4(), request("Ada Lovelace", &["Math"])).unwrap();
        service.create_profile(Uuid::new_v4(), request("Grace Hopper", &["COBOL", "Rust"])).unwrap();

        let by_name = service
            .search_profiles(&ProfileSearchQuery { q: Some("ada".into()), ..Default::default() })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        let by_skill = service
            .search_profiles(&ProfileSearchQuery { skill: Some("rust".into()), ..Default::default() })
            .unwrap();
        assert_eq!(by_skill[0].name, "Grace Hopper");
        assert_eq!(service.search_profiles(&ProfileSearchQuery::default()).unwrap().len(), 2);
    }
}
