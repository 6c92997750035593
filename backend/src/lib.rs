
//---------------------------------------
pub mod web_api {
    pub mod routes;
    pub mod controllers;
}

pub use web_api::routes::map_routes;
pub use web_api::controllers::*;
//---------------------------------------

//---------------------------------------
pub mod shared {
    pub mod models;
    pub mod dto;
}

pub use shared::models::*;
pub use shared::dto::*;
//---------------------------------------

//---------------------------------------
pub mod authentication {
    pub mod auth;
}
//---------------------------------------

//---------------------------------------
pub mod data_access {
    pub mod data_context;
    pub mod lookups;
}
//---------------------------------------

//---------------------------------------
pub mod services {
    pub mod activity_service;
    pub mod auth_service;
    pub mod feedback_service;
    pub mod file_service;
    pub mod file_storage;
    pub mod notification_service;
    pub mod payment_gateway;
    pub mod payment_service;
    pub mod profile_service;
    pub mod project_service;
    pub mod rating_service;
    pub mod subscription_service;
    pub mod task_service;
    pub mod user_service;
}
//---------------------------------------

pub mod error;
