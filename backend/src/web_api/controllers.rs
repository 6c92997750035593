pub mod activity_controller;
pub mod authentication_controller;
pub mod feedback_controller;
pub mod file_controller;
pub mod health_controller;
pub mod milestone_controller;
pub mod notification_controller;
pub mod payment_controller;
pub mod profile_controller;
pub mod project_controller;
pub mod rating_controller;
pub mod subscription_controller;
pub mod task_controller;
pub mod user_controller;
