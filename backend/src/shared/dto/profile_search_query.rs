use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileSearchQuery {
    pub q: Option<String>,
    pub skill: Option<String>,
    pub limit: Option<usize>,
}
