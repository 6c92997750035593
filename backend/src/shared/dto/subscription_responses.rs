use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::subscription::{Subscription, SubscriptionPlan, SubscriptionStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub subscription_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub paid: bool,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub paid: bool,
    pub plan: SubscriptionPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfoResponse {
    pub plan: SubscriptionPlan,
    pub amount_cents: u64,
    pub currency: String,
    pub interval: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub email: String,
    pub name: String,
    pub days_remaining: Option<i64>,
}
