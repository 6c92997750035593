use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub name: String,
    pub image_url: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub skill: Vec<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
}
