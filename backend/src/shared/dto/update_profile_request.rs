use serde::Deserialize;

/// Rating aggregates are deliberately absent: they are derived.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub phone_number: Option<String>,
    pub skill: Option<Vec<String>>,
    pub bio: Option<String>,
    pub address: Option<String>,
}
