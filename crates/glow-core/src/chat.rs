//! Messaging Gateway
//!
//! Provider-agnostic surface for delivering content to a chat. The payment
//! workflow and the dispatcher only ever talk to this trait; the Telegram
//! implementation lives in `glow-telegram` and is injected at construction
//! rather than reached through ambient global state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::UserId;

/// Target chat identifier (for direct messages this equals the user id)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl ChatId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<UserId> for ChatId {
    fn from(id: UserId) -> Self {
        Self(id.0)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an already-hosted media object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaRef {
    /// Messenger-side file id (re-sendable without re-upload)
    FileId(String),
    /// Publicly reachable URL
    Url(String),
}

impl MediaRef {
    pub fn as_str(&self) -> &str {
        match self {
            MediaRef::FileId(s) | MediaRef::Url(s) => s,
        }
    }
}

/// A single inline button
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineButton {
    /// Opens an external link
    Url { text: String, url: String },
    /// Sends a callback action back to the bot
    Callback { text: String, action: String },
}

/// Inline keyboard, one button per row
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Single full-width URL button
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new().row(vec![InlineButton::Url {
            text: text.into(),
            url: url.into(),
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outbound messaging surface
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Deliver a text message, optionally with an inline keyboard
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    /// Deliver a single photo with an optional caption
    async fn send_photo(&self, chat: ChatId, photo: &MediaRef, caption: Option<&str>)
    -> Result<()>;

    /// Deliver a video with optional caption and keyboard; `protect` disables
    /// forwarding/saving on the client
    async fn send_video(
        &self,
        chat: ChatId,
        video: &MediaRef,
        caption: Option<&str>,
        keyboard: Option<&InlineKeyboard>,
        protect: bool,
    ) -> Result<()>;

    /// Acknowledge a button press so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}
