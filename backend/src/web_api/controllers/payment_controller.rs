use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, MANAGERS},
    create_payment_request::CreatePaymentRequest,
    error::ApiResult,
    payment::Payment,
    payment_query::PaymentQuery,
    services::payment_service::PaymentService,
    update_payment_status_request::UpdatePaymentStatusRequest,
};

pub struct PaymentController {}

impl PaymentController {
    pub async fn create(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Json(body): Json<CreatePaymentRequest>,
    ) -> ApiResult<ApiResponse<Payment>> {
        require_role(&user, MANAGERS)?;
        let payment = PaymentService::new(&state.data_context).create_payment(body, &user)?;
        Ok(ApiResponse::created("Payment created successfully", payment))
    }

    pub async fn get_all(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Query(query): Query<PaymentQuery>,
    ) -> ApiResult<ApiResponse<Vec<Payment>>> {
        let payments = PaymentService::new(&state.data_context).list_payments(&query, &user)?;
        Ok(ApiResponse::ok("Payments retrieved successfully", payments))
    }

    pub async fn update_status(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdatePaymentStatusRequest>,
    ) -> ApiResult<ApiResponse<Payment>> {
        require_role(&user, MANAGERS)?;
        let payment = PaymentService::new(&state.data_context).update_payment_status(id, body)?;
        Ok(ApiResponse::ok("Payment status updated successfully", payment))
    }
}
