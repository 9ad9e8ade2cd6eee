//! Telegram Bot Client

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use glow_core::{
    ChatGateway, ChatId, CoreError, InlineButton, InlineKeyboard, MediaRef, Result,
};

use crate::format::render_html;
use crate::types::Update;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// How long the server holds a `getUpdates` call open
pub const LONG_POLL_SECS: u64 = 30;

/// Telegram client configuration
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    /// API base URL (overridable for tests)
    pub api_base: String,

    /// Bot token from @BotFather
    pub token: String,

    /// Per-request timeout in seconds; must exceed the long-poll hold
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            token: token.into(),
            timeout_secs: LONG_POLL_SECS + 10,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("BOT_TOKEN")
            .map_err(|_| CoreError::Config("BOT_TOKEN not set".into()))?;
        let mut config = Self::new(token);
        if let Ok(base) = std::env::var("TELEGRAM_API_BASE") {
            config.api_base = base;
        }
        Ok(config)
    }
}

/// Bot API response envelope
#[derive(Debug, serde::Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct ReplyMarkup {
    inline_keyboard: Vec<Vec<ApiButton>>,
}

#[derive(Serialize)]
struct ApiButton {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_data: Option<String>,
}

fn markup_from(keyboard: &InlineKeyboard) -> ReplyMarkup {
    ReplyMarkup {
        inline_keyboard: keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match button {
                        InlineButton::Url { text, url } => ApiButton {
                            text: text.clone(),
                            url: Some(url.clone()),
                            callback_data: None,
                        },
                        InlineButton::Callback { text, action } => ApiButton {
                            text: text.clone(),
                            url: None,
                            callback_data: Some(action.clone()),
                        },
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Telegram Bot API client
pub struct TelegramBot {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramBot {
    /// Create a new client
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Config(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(TelegramConfig::from_env()?)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_base, self.config.token)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Chat(format!("{method}: {e}")))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| CoreError::Chat(format!("{method}: invalid response ({status}): {e}")))?;

        if !envelope.ok {
            let description = envelope.description.unwrap_or_else(|| status.to_string());
            return Err(CoreError::Chat(format!("{method}: {description}")));
        }
        envelope
            .result
            .ok_or_else(|| CoreError::Chat(format!("{method}: empty result")))
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": LONG_POLL_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatGateway for TelegramBot {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat.as_i64(),
            "text": render_html(text),
            "parse_mode": "HTML",
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(markup_from(kb))?;
        }
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &MediaRef,
        caption: Option<&str>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat.as_i64(),
            "photo": photo.as_str(),
        });
        if let Some(caption) = caption {
            body["caption"] = render_html(caption).into();
            body["parse_mode"] = "HTML".into();
        }
        self.call::<serde_json::Value>("sendPhoto", &body).await?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        video: &MediaRef,
        caption: Option<&str>,
        keyboard: Option<&InlineKeyboard>,
        protect: bool,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat.as_i64(),
            "video": video.as_str(),
            "protect_content": protect,
        });
        if let Some(caption) = caption {
            body["caption"] = render_html(caption).into();
            body["parse_mode"] = "HTML".into();
        }
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(markup_from(kb))?;
        }
        self.call::<serde_json::Value>("sendVideo", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.call::<serde_json::Value>(
            "answerCallbackQuery",
            &serde_json::json!({ "callback_query_id": callback_id }),
        )
        .await?;
        Ok(())
    }
}
