use axum::{extract::State, Extension, Json};

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, SUPER_ADMIN},
    checkout_request::CheckoutRequest,
    error::ApiResult,
    services::subscription_service::SubscriptionService,
    subscription_responses::{
        ActiveSubscriptionView, CheckoutResponse, PriceInfoResponse, SubscriptionStatusResponse,
        VerifyPaymentResponse,
    },
    verify_payment_request::VerifyPaymentRequest,
};

fn service(state: &SharedState) -> SubscriptionService<'_> {
    SubscriptionService::new(&state.data_context, state.payment_gateway.as_ref(), &state.settings)
}

pub struct SubscriptionController {}

impl SubscriptionController {
    pub async fn create_checkout(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CheckoutRequest>,
    ) -> ApiResult<ApiResponse<CheckoutResponse>> {
        let checkout = service(&state).create_checkout_session(user.user_id, body).await?;
        Ok(ApiResponse::ok("Checkout session created successfully", checkout))
    }

    pub async fn verify_payment(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<VerifyPaymentRequest>,
    ) -> ApiResult<ApiResponse<VerifyPaymentResponse>> {
        let result = service(&state).verify_payment(user.user_id, &body.session_id).await?;
        let message = if result.paid {
            "Payment verified successfully. You are now a premium member!"
        } else {
            "Payment not completed. Please try again."
        };
        Ok(ApiResponse::ok(message, result))
    }

    pub async fn status(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<SubscriptionStatusResponse>> {
        let status = service(&state).get_status(user.user_id)?;
        Ok(ApiResponse::ok("Subscription status retrieved successfully", status))
    }

    pub async fn price(State(state): State<SharedState>) -> ApiResponse<PriceInfoResponse> {
        ApiResponse::ok("Price info retrieved successfully", service(&state).price_info())
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
    ) -> ApiResult<ApiResponse<Vec<ActiveSubscriptionView>>> {
        require_role(&user, SUPER_ADMIN)?;
        let subscriptions = service(&state).list_active_subscriptions()?;
        Ok(ApiResponse::ok("Subscriptions retrieved successfully", subscriptions))
    }
}
