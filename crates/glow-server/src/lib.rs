//! # glow-server
//!
//! The deployable surface of glow-bot: an axum server receiving provider
//! webhooks, and a long-poll dispatcher feeding chat updates through the
//! access gate into the funnel and the payment workflow.

pub mod admin;
pub mod config;
pub mod dispatcher;
pub mod drip;
pub mod gate;
pub mod handlers;
pub mod outbox;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, payment_webhook};
use crate::state::AppState;

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook/payment", post(payment_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
