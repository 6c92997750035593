use std::sync::Arc;

use crate::{
    data_access::data_context::DataContext,
    services::{file_storage::FileStorage, payment_gateway::PaymentGateway},
    settings::Settings,
};

/// Everything a request handler needs, built once in `main`.
pub struct AppState {
    pub data_context: DataContext,
    pub settings: Settings,
    pub file_storage: FileStorage,
    pub payment_gateway: Arc<dyn PaymentGateway>,
}

pub type SharedState = Arc<AppState>;
