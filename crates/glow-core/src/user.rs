//! User Accounts
//!
//! One record per Telegram user, created lazily on first contact by the
//! access gate and never deleted. `has_access` is the flag gating delivery
//! of the paid course link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-assigned numeric user identifier (immutable key)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional profile fields picked up from the incoming update (UX only)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileHints {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A user account record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// Telegram user id
    pub id: UserId,

    /// Telegram @username, if set
    pub username: Option<String>,

    /// Display name fields
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// Admin flag, set out-of-band
    pub is_admin: bool,

    /// Whether the paid course is unlocked for this user
    pub has_access: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a fresh account for a first contact
    pub fn new(id: UserId, hints: &ProfileHints) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: hints.username.clone(),
            first_name: hints.first_name.clone(),
            last_name: hints.last_name.clone(),
            is_admin: false,
            has_access: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Best display name available for logs and greetings
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("there")
    }
}
