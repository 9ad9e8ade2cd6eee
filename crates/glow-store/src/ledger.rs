//! Store Traits
//!
//! Object-safe async seams so the workflow and the server can run against
//! Postgres in production and the in-memory store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use glow_core::{PaymentAttempt, PaymentStatus, ProfileHints, User, UserId};

use crate::error::StoreError;

/// An admin-uploaded media object, keyed by its catalogue name
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoAsset {
    pub name: String,
    /// Messenger-side file id, re-sendable without re-upload
    pub file_id: String,
    pub file_size: Option<i64>,
    pub duration_secs: Option<i32>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VideoAsset {
    pub fn new(name: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_id: file_id.into(),
            file_size: None,
            duration_secs: None,
            mime_type: None,
            created_at: Utc::now(),
        }
    }
}

/// User accounts and payment attempts
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load-or-create the account for a platform id. Concurrent first
    /// contacts for the same id must collapse into a single row; profile
    /// hints refresh on every contact.
    async fn ensure_user(&self, id: UserId, hints: &ProfileHints) -> Result<User, StoreError>;

    /// Look up an account
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Flip the access flag on
    async fn grant_access(&self, id: UserId) -> Result<(), StoreError>;

    /// Record a freshly opened charge
    async fn insert_attempt(&self, attempt: &PaymentAttempt) -> Result<(), StoreError>;

    /// Look up an attempt by provider charge id
    async fn attempt(&self, charge_id: &str) -> Result<Option<PaymentAttempt>, StoreError>;

    /// Conditionally move an attempt to `status`. The update applies only if
    /// the stored status is non-terminal and differs from `status`; returns
    /// whether it applied. This single check-and-set is what makes duplicate
    /// and racing webhook deliveries commute.
    async fn advance_status(
        &self,
        charge_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, StoreError>;

    /// All attempts for a user, newest first
    async fn attempts_for_user(&self, id: UserId) -> Result<Vec<PaymentAttempt>, StoreError>;
}

/// Admin-side state: uploaded media and upload-mode sessions
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Save or replace a media asset by name
    async fn save_video(&self, video: &VideoAsset) -> Result<(), StoreError>;

    /// Look up a media asset
    async fn video(&self, name: &str) -> Result<Option<VideoAsset>, StoreError>;

    /// Open (or refresh) an upload session for an admin; expires after `ttl`
    async fn open_upload_session(&self, admin: UserId, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically consume the admin's session. Returns `true` only if an
    /// unexpired session existed; the session is gone afterwards either way.
    async fn take_upload_session(&self, admin: UserId) -> Result<bool, StoreError>;

    /// Drop the admin's session without consuming it
    async fn close_upload_session(&self, admin: UserId) -> Result<(), StoreError>;
}
