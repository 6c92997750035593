use serde::Deserialize;
use uuid::Uuid;

use crate::payment::PaymentStatus;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub payer_id: Option<Uuid>,
    pub payee_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
}
