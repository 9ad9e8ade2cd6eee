//! Payment Error Types

use thiserror::Error;

use glow_store::StoreError;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Provider call failed (network or provider-side)
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Provider answered with something we cannot type
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Webhook references a charge this system never created
    #[error("Unknown payment attempt: {0}")]
    UnknownAttempt(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid")]
    InvalidSignature,

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Ledger store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Whether a provider-side retry (webhook redelivery) could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::GatewayUnavailable(_)
                | PaymentError::Storage(_)
                | PaymentError::UnknownAttempt(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::GatewayUnavailable(_) | PaymentError::InvalidResponse(_) => {
                "Payment service is temporarily unavailable. Please try again later."
            }
            PaymentError::Storage(_) => "Something went wrong on our side. Please try again.",
            _ => "An error occurred processing your request.",
        }
    }
}
