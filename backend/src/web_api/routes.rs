pub mod activity_routes;
pub mod authentication_routes;
pub mod feedback_routes;
pub mod file_routes;
pub mod health_routes;
pub mod milestone_routes;
pub mod notification_routes;
pub mod payment_routes;
pub mod profile_routes;
pub mod project_routes;
pub mod rating_routes;
pub mod subscription_routes;
pub mod task_routes;
pub mod user_routes;

use std::sync::Arc;

use axum::Router;

use crate::app_state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn map_routes(app_state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(authentication_routes::get_router(app_state.clone()))
        .merge(user_routes::get_router(app_state.clone()))
        .merge(profile_routes::get_router(app_state.clone()))
        .merge(project_routes::get_router(app_state.clone()))
        .merge(milestone_routes::get_router(app_state.clone()))
        .merge(task_routes::get_router(app_state.clone()))
        .merge(file_routes::get_router(app_state.clone()))
        .merge(payment_routes::get_router(app_state.clone()))
        .merge(notification_routes::get_router(app_state.clone()))
        .merge(feedback_routes::get_router(app_state.clone()))
        .merge(activity_routes::get_router(app_state.clone()))
        .merge(rating_routes::get_router(app_state.clone()))
        .merge(subscription_routes::get_router(app_state.clone()));

    Router::new()
        .merge(health_routes::get_router(app_state))
        .nest(API_PREFIX, api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        authentication::auth::create_token,
        data_access::data_context::{
            tests::{seed_user, temp_path},
            DataContext,
        },
        role::Role,
        services::{file_storage::FileStorage, payment_gateway::UnconfiguredGateway},
        settings::Settings,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn settings() -> Settings {
        Settings::parse(
            r#"{
                "tcp_socket_binding": "127.0.0.1",
                "tcp_socket_port": 0,
                "database_path": "unused.redb",
                "upload_dir": "/tmp/taskflow-router-uploads",
                "jwt_secret": "access-secret",
                "jwt_refresh_secret": "refresh-secret",
                "default_admin_email": "admin@example.com",
                "default_admin_password": "secret1"
            }"#,
        )
        .unwrap()
    }

    fn app(data_context: DataContext) -> Router {
        let settings = settings();
        let state = Arc::new(AppState {
            data_context,
            file_storage: FileStorage::new(&settings.upload_dir),
            payment_gateway: Arc::new(UnconfiguredGateway),
            settings,
        });
        map_routes(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn sign_in(app: &Router, email: &str, role: &str) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": email, "password": "secret1", "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let path = temp_path("router_health");
        let app = app(DataContext::new(&path.0).unwrap());
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let path = temp_path("router_unauthorized");
        let app = app(DataContext::new(&path.0).unwrap());

        let (status, body) = call(&app, Method::GET, "/api/v1/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 401);

        let (status, _) = call(&app, Method::GET, "/api/v1/projects", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn managers_create_projects_developers_cannot() {
        let path = temp_path("router_projects");
        let app = app(DataContext::new(&path.0).unwrap());
        let pm = sign_in(&app, "pm@example.com", "project_manager").await;
        let dev = sign_in(&app, "dev@example.com", "developer").await;

        let project = json!({
            "name": "Apollo",
            "startDate": "2026-01-01T00:00:00Z",
            "endDate": "2026-06-01T00:00:00Z",
            "budget": 5000.0
        });
        let (status, body) = call(&app, Method::POST, "/api/v1/projects", Some(&pm), Some(project.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["name"], "Apollo");

        let (status, _) = call(&app, Method::POST, "/api/v1/projects", Some(&dev), Some(project)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, Method::GET, "/api/v1/projects", Some(&pm), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn checkout_without_gateway_is_unavailable() {
        let path = temp_path("router_checkout");
        let app = app(DataContext::new(&path.0).unwrap());
        let dev = sign_in(&app, "dev@example.com", "developer").await;

        let (status, body) = call(&app, Method::GET, "/api/v1/subscriptions/price", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amountCents"], 4999);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/subscriptions/create-checkout",
            Some(&dev),
            Some(json!({ "successUrl": "https://app.test/ok", "cancelUrl": "https://app.test/no" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "Payment gateway is not configured");
    }

    #[tokio::test]
    async fn activity_reads_are_for_project_members() {
        let path = temp_path("router_activity");
        let data = DataContext::new(&path.0).unwrap();
        let admin = seed_user(&data, Role::SuperAdmin, None);
        let admin_token = create_token(&admin, &settings()).unwrap();
        let app = app(data);
        let dev = sign_in(&app, "dev@example.com", "developer").await;
        let pm = sign_in(&app, "pm@example.com", "project_manager").await;

        let (_, me) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "dev@example.com", "password": "secret1" })),
        )
        .await;
        let dev_id = me["data"]["user"]["id"].as_str().unwrap().to_string();
        let other = Uuid::new_v4();

        let own = format!("/api/v1/activity/user/{dev_id}");
        let (status, _) = call(&app, Method::GET, &own, Some(&dev), None).await;
        assert_eq!(status, StatusCode::OK);

        let theirs = format!("/api/v1/activity/user/{other}");
        let (status, _) = call(&app, Method::GET, &theirs, Some(&dev), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::GET, &theirs, Some(&pm), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, &theirs, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
