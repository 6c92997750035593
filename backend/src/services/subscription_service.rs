use chrono::{Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    checkout_request::CheckoutRequest,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    services::payment_gateway::{CheckoutParams, PaymentGateway},
    settings::Settings,
    subscription::{Subscription, SubscriptionPlan, SubscriptionStatus},
    subscription_responses::{
        ActiveSubscriptionView, CheckoutResponse, PriceInfoResponse, SubscriptionStatusResponse,
        VerifyPaymentResponse,
    },
    user::User,
};

const SUBSCRIPTION_DAYS: i64 = 365;
const CURRENCY: &str = "usd";
const PRODUCT_NAME: &str = "Premium Subscription (1 Year)";

pub struct SubscriptionService<'a> {
    data: &'a DataContext,
    gateway: &'a dyn PaymentGateway,
    settings: &'a Settings,
}

impl<'a> SubscriptionService<'a> {
    pub fn new(data: &'a DataContext, gateway: &'a dyn PaymentGateway, settings: &'a Settings) -> Self {
        Self { data, gateway, settings }
    }

    fn load_user(&self, user_id: Uuid) -> ApiResult<User> {
        self.data
            .get::<User>(user_id)?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    #[instrument(skip(self, request))]
    pub async fn create_checkout_session(&self, user_id: Uuid, request: CheckoutRequest) -> ApiResult<CheckoutResponse> {
        let user = self.load_user(user_id)?;
        if user.paid {
            return Err(ApiError::bad_request("User is already a premium member"));
        }

        let session = self
            .gateway
            .create_checkout_session(CheckoutParams {
                user_id,
                amount_cents: self.settings.premium_price_cents,
                currency: CURRENCY.to_string(),
                product_name: PRODUCT_NAME.to_string(),
                success_url: request.success_url,
                cancel_url: request.cancel_url,
            })
            .await?;
        let url = session
            .url
            .clone()
            .ok_or_else(|| ApiError::Internal(format!("checkout session {} has no url", session.id)))?;

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id,
            stripe_session_id: Some(session.id.clone()),
            stripe_customer_id: None,
            plan: SubscriptionPlan::Premium,
            status: SubscriptionStatus::Pending,
            paid_at: None,
            expires_at: Some(now + Duration::days(SUBSCRIPTION_DAYS)),
            created_at: now,
            updated_at: now,
        };
        self.data.put_subscription(&subscription)?;
        info!(subscription_id = %subscription.id, session_id = %session.id, "pending subscription created");

        Ok(CheckoutResponse {
            session_id: session.id,
            url,
            subscription_id: subscription.id,
        })
    }

    /// Activates the subscription and marks the user paid once the gateway reports payment.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, user_id: Uuid, session_id: &str) -> ApiResult<VerifyPaymentResponse> {
        let session = self.gateway.retrieve_session(session_id).await?;
        if session.user_id() != Some(user_id) {
            return Err(ApiError::forbidden("Session does not belong to this user"));
        }
        let subscription = self
            .data
            .get_subscription_by_session(session_id)?
            .ok_or_else(|| ApiError::not_found("Subscription not found"))?;
        if subscription.user_id != user_id {
            return Err(ApiError::forbidden("Session does not belong to this user"));
        }

        if !session.is_paid() {
            return Ok(VerifyPaymentResponse { paid: false, subscription });
        }

        self.data
            .modify(user_id, |user: &mut User| -> ApiResult<()> {
                user.paid = true;
                user.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let customer = session.customer.clone();
        let subscription = self
            .data
            .modify(subscription.id, |subscription: &mut Subscription| -> ApiResult<Subscription> {
                if subscription.status != SubscriptionStatus::Active {
                    let now = Utc::now();
                    subscription.status = SubscriptionStatus::Active;
                    subscription.stripe_customer_id = customer;
                    subscription.paid_at = Some(now);
                    subscription.updated_at = now;
                }
                Ok(subscription.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Subscription not found"))?;
        info!(subscription_id = %subscription.id, %user_id, "subscription activated");

        Ok(VerifyPaymentResponse { paid: true, subscription })
    }

    pub fn get_status(&self, user_id: Uuid) -> ApiResult<SubscriptionStatusResponse> {
        let user = self.load_user(user_id)?;
        let latest = self
            .data
            .scan::<Subscription>()?
            .into_iter()
            .filter(|s| s.user_id == user_id && s.status == SubscriptionStatus::Active)
            .max_by_key(|s| s.created_at);

        let now = Utc::now();
        Ok(match latest {
            Some(subscription) => SubscriptionStatusResponse {
                paid: user.paid,
                plan: subscription.plan,
                status: Some(subscription.status),
                expires_at: subscription.expires_at,
                days_remaining: subscription.days_remaining(now),
            },
            None => SubscriptionStatusResponse {
                paid: user.paid,
                plan: if user.paid { SubscriptionPlan::Premium } else { SubscriptionPlan::Free },
                status: None,
                expires_at: None,
                days_remaining: None,
            },
        })
    }

    pub fn price_info(&self) -> PriceInfoResponse {
        PriceInfoResponse {
            plan: SubscriptionPlan::Premium,
            amount_cents: self.settings.premium_price_cents,
            currency: CURRENCY.to_string(),
            interval: "year".to_string(),
        }
    }

    /// Most recently paid first.
    pub fn list_active_subscriptions(&self) -> ApiResult<Vec<ActiveSubscriptionView>> {
        let mut active: Vec<Subscription> = self
            .data
            .scan::<Subscription>()?
            .into_iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .collect();
        active.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));

        let names = self.data.display_names(active.iter().map(|s| s.user_id))?;
        let now = Utc::now();
        active
            .into_iter()
            .map(|subscription| -> ApiResult<ActiveSubscriptionView> {
                let email = self
                    .data
                    .get::<User>(subscription.user_id)?
                    .map(|u| u.email)
                    .unwrap_or_default();
                let name = names.get(&subscription.user_id).cloned().unwrap_or_default();
                let days_remaining = subscription.days_remaining(now);
                Ok(ActiveSubscriptionView { subscription, email, name, days_remaining })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_access::data_context::tests::{seed_user, temp_db},
        role::Role,
        services::payment_gateway::{tests::FakeGateway, UnconfiguredGateway},
    };

    fn settings() -> Settings {
        Settings::parse(
            r#"{
                "tcp_socket_binding": "127.0.0.1",
                "tcp_socket_port": 0,
                "database_path": "unused.redb",
                "jwt_secret": "a",
                "jwt_refresh_secret": "b",
                "default_admin_email": "admin@example.com",
                "default_admin_password": "secret1",
                "premium_price_cents": 1500
            }"#,
        )
        .unwrap()
    }

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            success_url: "https://app.test/ok".into(),
            cancel_url: "https://app.test/cancel".into(),
        }
    }

    #[tokio::test]
    async fn checkout_then_verify_activates_premium() {
        let db = temp_db("subscription_flow");
        let settings = settings();
        let gateway = FakeGateway::default();
        let service = SubscriptionService::new(&db.data, &gateway, &settings);
        let user = seed_user(&db.data, Role::Developer, Some("Dev"));

        let opened = service.create_checkout_session(user.id, checkout()).await.unwrap();
        let pending = db.data.get_subscription_by_session(&opened.session_id).unwrap().unwrap();
        assert_eq!(pending.status, SubscriptionStatus::Pending);
        assert_eq!(pending.days_remaining(Utc::now()), Some(365));

        let unpaid = service.verify_payment(user.id, &opened.session_id).await.unwrap();
        assert!(!unpaid.paid);

        gateway.mark_paid(&opened.session_id);
        let verified = service.verify_payment(user.id, &opened.session_id).await.unwrap();
        assert!(verified.paid);
        assert_eq!(verified.subscription.status, SubscriptionStatus::Active);
        assert_eq!(verified.subscription.stripe_customer_id.as_deref(), Some("cus_test"));
        assert!(db.data.get::<User>(user.id).unwrap().unwrap().paid);

        let status = service.get_status(user.id).unwrap();
        assert!(status.paid);
        assert_eq!(status.plan, SubscriptionPlan::Premium);

        let active = service.list_active_subscriptions().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Dev");

        assert!(matches!(
            service.create_checkout_session(user.id, checkout()).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn sessions_are_bound_to_their_user() {
        let db = temp_db("subscription_owner");
        let settings = settings();
        let gateway = FakeGateway::default();
        let service = SubscriptionService::new(&db.data, &gateway, &settings);
        let owner = seed_user(&db.data, Role::Developer, None);
        let intruder = seed_user(&db.data, Role::Developer, None);

        let opened = service.create_checkout_session(owner.id, checkout()).await.unwrap();
        gateway.mark_paid(&opened.session_id);
        assert!(matches!(
            service.verify_payment(intruder.id, &opened.session_id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(!db.data.get::<User>(intruder.id).unwrap().unwrap().paid);
        assert!(matches!(
            service.create_checkout_session(Uuid::new_v4(), checkout()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unconfigured_gateway_reports_unavailable() {
        let db = temp_db("subscription_unconfigured");
        let settings = settings();
        let service = SubscriptionService::new(&db.data, &UnconfiguredGateway, &settings);
        let user = seed_user(&db.data, Role::Developer, None);

        assert!(matches!(
            service.create_checkout_session(user.id, checkout()).await,
            Err(ApiError::ServiceUnavailable(_))
        ));
        assert_eq!(service.price_info().amount_cents, 1500);
        assert_eq!(service.get_status(user.id).unwrap().plan, SubscriptionPlan::Free);
    }
}
