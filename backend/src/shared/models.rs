pub mod activity;
pub mod app_state;
pub mod feedback;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod project;
pub mod rating;
pub mod role;
pub mod settings;
pub mod subscription;
pub mod task;
pub mod task_priority;
pub mod task_status;
pub mod user;
