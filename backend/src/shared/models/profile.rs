use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{create_profile_request::CreateProfileRequest, update_profile_request::UpdateProfileRequest};

/// Count of ratings received at each star value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingsBreakdown {
    #[serde(rename = "1", default)]
    pub one: u32,
    #[serde(rename = "2", default)]
    pub two: u32,
    #[serde(rename = "3", default)]
    pub three: u32,
    #[serde(rename = "4", default)]
    pub four: u32,
    #[serde(rename = "5", default)]
    pub five: u32,
}

impl RatingsBreakdown {
    /// Stars outside 1..=5 are ignored.
    pub fn record(&mut self, stars: u8) {
        match stars {
            1 => self.one += 1,
            2 => self.two += 1,
            3 => self.three += 1,
            4 => self.four += 1,
            5 => self.five += 1,
            _ => {}
        }
    }

    pub fn count(&self, stars: u8) -> u32 {
        match stars {
            1 => self.one,
            2 => self.two,
            3 => self.three,
            4 => self.four,
            5 => self.five,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    /// Owning user. At most one profile per user.
    pub auth: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub skill: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    // Derived from ratings; only the rating service writes these.
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_ratings: u32,
    #[serde(default)]
    pub ratings_breakdown: RatingsBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(auth: Uuid, request: CreateProfileRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            auth,
            name: request.name.trim().to_string(),
            image_url: request.image_url,
            phone_number: request.phone_number,
            skill: request.skill,
            bio: request.bio,
            address: request.address,
            average_rating: 0.0,
            total_ratings: 0,
            ratings_breakdown: RatingsBreakdown::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn edit(&mut self, request: UpdateProfileRequest) {
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(image_url) = request.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(phone_number) = request.phone_number {
            self.phone_number = Some(phone_number);
        }
        if let Some(skill) = request.skill {
            self.skill = skill;
        }
        if let Some(bio) = request.bio {
            self.bio = Some(bio);
        }
        if let Some(address) = request.address {
            self.address = Some(address);
        }
        self.updated_at = Utc::now();
    }
}
