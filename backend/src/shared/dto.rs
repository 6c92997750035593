// Requests
pub mod signup_request;
pub mod login_request;
pub mod refresh_token_request;
pub mod update_role_request;
pub mod create_profile_request;
pub mod update_profile_request;
pub mod profile_search_query;
pub mod create_project_request;
pub mod update_project_request;
pub mod add_team_member_request;
pub mod create_milestone_request;
pub mod update_milestone_request;
pub mod create_task_request;
pub mod update_task_request;
pub mod log_time_request;
pub mod add_comment_request;
pub mod task_list_query;
pub mod activity_query;
pub mod task_activity_query;
pub mod create_rating_request;
pub mod page_query;
pub mod notification_query;
pub mod create_payment_request;
pub mod payment_query;
pub mod update_payment_status_request;
pub mod checkout_request;
pub mod verify_payment_request;
pub mod create_feedback_request;

// Responses
pub mod api_response;
pub mod login_response;
pub mod token_response;
pub mod user_get_response;
pub mod platform_analytics_response;
pub mod task_detail_response;
pub mod activity_view;
pub mod rating_view;
pub mod notification_page;
pub mod project_detail_response;
pub mod dashboard_stats_response;
pub mod subscription_responses;
pub mod feedback_view;
