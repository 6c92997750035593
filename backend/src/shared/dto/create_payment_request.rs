use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub task_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub payee_id: Uuid,
    pub amount: f64,
    pub currency: Option<String>,
    pub transaction_id: Option<String>,
}
