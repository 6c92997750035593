use serde::Deserialize;

use crate::payment::PaymentStatus;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
}
