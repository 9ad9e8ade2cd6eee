//! Server Configuration

use anyhow::Context;

/// Settings read once at startup; the Telegram and provider clients read
/// their own credentials through their `from_env` constructors.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// HTTP bind address
    pub bind_addr: String,

    /// Postgres connection string
    pub database_url: String,

    /// Shared secret for webhook signature verification
    pub webhook_secret: String,

    /// Path to the message catalogue
    pub content_path: String,

    /// Where the provider sends the buyer after checkout
    pub return_url: String,

    /// The gated channel invite unlocked on payment
    pub access_link: String,
}

impl ServerConfig {
    /// Create from environment variables; missing required vars fail startup
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            webhook_secret: std::env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET not set")?,
            content_path: std::env::var("CONTENT_PATH")
                .unwrap_or_else(|_| "data/messages.json".into()),
            return_url: std::env::var("RETURN_URL").unwrap_or_else(|_| "https://t.me".into()),
            access_link: std::env::var("SECRET_LINK").context("SECRET_LINK not set")?,
        })
    }
}
