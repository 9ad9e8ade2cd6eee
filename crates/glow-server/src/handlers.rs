//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;

use glow_payments::{SIGNATURE_HEADER, WebhookEvent, parse_event, verify_signature};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Provider webhook endpoint.
///
/// 200 acknowledges delivery of any authenticated, well-formed event —
/// including duplicates that reconcile to a no-op and event types we do not
/// care about. 5xx is reserved for failures the provider should retry.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "Missing webhook signature",
                "MISSING_SIGNATURE",
            )
        })?;

    verify_signature(&state.webhook_secret, body.as_bytes(), signature).map_err(|_| {
        tracing::warn!("Webhook signature verification failed");
        error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid webhook signature",
            "INVALID_SIGNATURE",
        )
    })?;

    let event = parse_event(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed webhook payload");
        error_response(StatusCode::BAD_REQUEST, "Malformed payload", "BAD_PAYLOAD")
    })?;

    let charge_id = match event {
        WebhookEvent::PaymentChanged { charge_id } => charge_id,
        WebhookEvent::Ignored { event } => {
            tracing::debug!(event, "Ignoring webhook event");
            return Ok(StatusCode::OK);
        }
    };

    match state.workflow.reconcile(&charge_id).await {
        Ok(outcome) => {
            tracing::info!(
                charge_id,
                status = %outcome.status,
                access_granted = outcome.access_granted,
                "Webhook reconciled"
            );
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(charge_id, error = %e, "Webhook reconciliation failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reconciliation failed",
                "RECONCILE_ERROR",
            ))
        }
    }
}
