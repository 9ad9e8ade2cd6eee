//! Application State

use std::sync::Arc;

use glow_payments::PaymentWorkflow;

/// Shared application state for the HTTP surface
#[derive(Clone)]
pub struct AppState {
    /// The payment-confirmation core
    pub workflow: Arc<PaymentWorkflow>,

    /// Shared secret for webhook signature verification
    pub webhook_secret: Arc<str>,
}

impl AppState {
    pub fn new(workflow: Arc<PaymentWorkflow>, webhook_secret: impl Into<Arc<str>>) -> Self {
        Self {
            workflow,
            webhook_secret: webhook_secret.into(),
        }
    }
}
