//! Bot API Wire Types
//!
//! Only the fields the funnel actually reads; Telegram sends far more.

use serde::Deserialize;

/// One long-poll update
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// The sender of a message or button press
#[derive(Clone, Debug, Deserialize)]
pub struct IncomingUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Video attachment metadata
#[derive(Clone, Debug, Deserialize)]
pub struct IncomingVideo {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// An inbound chat message
#[derive(Clone, Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<IncomingUser>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub video: Option<IncomingVideo>,
}

/// An inline-button press
#[derive(Clone, Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: IncomingUser,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}
