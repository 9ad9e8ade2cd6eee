//! # glow-payments
//!
//! Charge creation and webhook reconciliation against a redirect-based
//! payment provider.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  buy   ┌──────────────┐  create   ┌──────────────┐
//! │   Chat   │───────▶│   Workflow   │──────────▶│   Provider   │
//! │   user   │◀───────│              │◀──────────│  (YooKassa)  │
//! └──────────┘  link  └──────┬───────┘ charge id └──────┬───────┘
//!                           ledger                      │
//!                        row: pending                   │ webhook
//!                                                       ▼
//! ┌──────────┐ unlock ┌──────────────┐ reconcile ┌──────────────┐
//! │   Chat   │◀───────│   Workflow   │◀──────────│   Receiver   │
//! │   user   │  once  │              │           │  (verified)  │
//! └──────────┘        └──────────────┘           └──────────────┘
//! ```
//!
//! The provider delivers webhooks at least once; reconciliation re-fetches
//! the authoritative charge status and applies it through a single
//! conditional store update, so repeated or racing deliveries can grant
//! access and notify the buyer at most once.

mod error;
mod gateway;
mod webhook;
mod workflow;

pub use error::{PaymentError, Result};
pub use gateway::{Charge, NewCharge, PaymentProvider, YookassaClient, YookassaConfig};
pub use webhook::{
    SIGNATURE_HEADER, WebhookEvent, parse_event, sign_payload, verify_signature,
};
pub use workflow::{CreatedCharge, PaymentWorkflow, Reconciliation, WorkflowConfig};
