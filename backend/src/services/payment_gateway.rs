use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{error::ApiError, settings::Settings};

const STRIPE_API: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotConfigured => {
                ApiError::ServiceUnavailable("Payment gateway is not configured".into())
            }
            GatewayError::Rejected(message) => ApiError::BadRequest(message),
            GatewayError::Http(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub user_id: Uuid,
    pub amount_cents: u64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// The user the session was opened for, as recorded in its metadata.
    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata.get("userId").and_then(|id| id.parse().ok())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, params: CheckoutParams) -> Result<CheckoutSession, GatewayError>;
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError>;
}

/// Stands in when no secret key is configured; every call fails.
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_checkout_session(&self, _: CheckoutParams) -> Result<CheckoutSession, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn retrieve_session(&self, _: &str) -> Result<CheckoutSession, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: String,
}

/// Stripe Checkout over its form-encoded REST API.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
}

/// Stripe substitutes the session id into this placeholder on redirect.
fn with_session_placeholder(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}session_id={{CHECKOUT_SESSION_ID}}")
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
        }
    }

    async fn parse(response: reqwest::Response) -> Result<CheckoutSession, GatewayError> {
        if response.status().is_success() {
            return Ok(response.json::<CheckoutSession>().await?);
        }
        let status = response.status();
        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("Payment gateway returned {status}"),
        };
        Err(GatewayError::Rejected(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, params: CheckoutParams) -> Result<CheckoutSession, GatewayError> {
        let form = [
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", params.currency),
            ("line_items[0][price_data][unit_amount]", params.amount_cents.to_string()),
            ("line_items[0][price_data][product_data][name]", params.product_name),
            ("metadata[userId]", params.user_id.to_string()),
            ("success_url", with_session_placeholder(&params.success_url)),
            ("cancel_url", params.cancel_url),
        ];
        let response = self
            .client
            .post(format!("{STRIPE_API}/checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;
        let session = Self::parse(response).await?;
        info!(session_id = %session.id, user_id = %params.user_id, "checkout session created");
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .client
            .get(format!("{STRIPE_API}/checkout/sessions/{session_id}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        let session = Self::parse(response).await?;
        debug!(session_id, status = %session.payment_status, "checkout session retrieved");
        Ok(session)
    }
}

pub fn from_settings(settings: &Settings) -> Arc<dyn PaymentGateway> {
    match settings.stripe_secret_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Arc::new(StripeGateway::new(key)),
        _ => {
            info!("no payment gateway key configured; checkout is disabled");
            Arc::new(UnconfiguredGateway)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory gateway: sessions start unpaid until `mark_paid`.
    #[derive(Default)]
    pub(crate) struct FakeGateway {
        sessions: Mutex<HashMap<String, CheckoutSession>>,
    }

    impl FakeGateway {
        pub(crate) fn mark_paid(&self, session_id: &str) {
            if let Some(session) = self.sessions.lock().unwrap().get_mut(session_id) {
                session.payment_status = "paid".into();
                session.customer = Some("cus_test".into());
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout_session(&self, params: CheckoutParams) -> Result<CheckoutSession, GatewayError> {
            let id = format!("cs_test_{}", Uuid::new_v4().simple());
            let session = CheckoutSession {
                id: id.clone(),
                url: Some(format!("https://checkout.test/{id}")),
                payment_status: "unpaid".into(),
                customer: None,
                metadata: HashMap::from([("userId".to_string(), params.user_id.to_string())]),
            };
            self.sessions.lock().unwrap().insert(id, session.clone());
            Ok(session)
        }

        async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
            self.sessions
                .lock()
                .unwrap()
                .get(session_id)
                .cloned()
                .ok_or_else(|| GatewayError::Rejected(format!("No such checkout session: {session_id}")))
        }
    }

    #[test]
    fn success_url_gets_session_placeholder() {
        assert_eq!(
            with_session_placeholder("https://app.test/done"),
            "https://app.test/done?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(
            with_session_placeholder("https://app.test/done?x=1"),
            "https://app.test/done?x=1&session_id={CHECKOUT_SESSION_ID}"
        );
    }

    #[test]
    fn session_metadata_names_the_user() {
        let user_id = Uuid::new_v4();
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "payment_status": "paid",
            "metadata": { "userId": user_id.to_string() }
        }))
        .unwrap();
        assert!(session.is_paid());
        assert_eq!(session.user_id(), Some(user_id));
    }

    #[tokio::test]
    async fn unconfigured_gateway_is_unavailable() {
        let err = UnconfiguredGateway.retrieve_session("cs_1").await.unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::ServiceUnavailable(_)));
    }
}
