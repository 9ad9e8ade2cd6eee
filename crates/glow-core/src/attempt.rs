//! Payment Attempts
//!
//! One ledger entry per provider charge, tracked end-to-end. Status follows
//! the provider's own vocabulary and advances monotonically:
//!
//! ```text
//! pending ──────────────────────────▶ succeeded   [terminal]
//! pending ──────────────────────────▶ canceled    [terminal]
//! pending ──▶ waiting_for_capture ──▶ succeeded | canceled
//! ```
//!
//! No transition ever leaves a terminal state. A repeated delivery of the
//! stored terminal status is the normal shape of a duplicate webhook and is
//! treated as a no-op, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tier::Tier;
use crate::user::UserId;

/// Lifecycle status of a charge, as reported by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
        }
    }

    /// Parse the provider's wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "waiting_for_capture" => Some(PaymentStatus::WaitingForCapture),
            "succeeded" => Some(PaymentStatus::Succeeded),
            "canceled" => Some(PaymentStatus::Canceled),
            _ => None,
        }
    }

    /// Terminal statuses never regress
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Canceled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single payment attempt (ledger entry), keyed by the provider charge id
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// Provider-issued charge id (unique)
    pub charge_id: String,

    /// Owning user
    pub user_id: UserId,

    /// Tier being purchased
    pub tier: Tier,

    /// Amount in whole rubles
    pub amount_rub: i64,

    /// ISO currency code
    pub currency: String,

    /// Human-readable description (display only)
    pub description: String,

    /// Current lifecycle status
    pub status: PaymentStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last status change timestamp
    pub updated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    /// Create a fresh `pending` entry for a just-opened charge
    pub fn pending(charge_id: impl Into<String>, user_id: UserId, tier: Tier) -> Self {
        let now = Utc::now();
        Self {
            charge_id: charge_id.into(),
            user_id,
            tier,
            amount_rub: tier.price_rub(),
            currency: "RUB".into(),
            description: tier.description().into(),
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
