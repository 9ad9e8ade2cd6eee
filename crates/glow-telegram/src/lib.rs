//! # glow-telegram
//!
//! Telegram Bot API implementation of the `glow-core` messaging gateway,
//! plus the long-poll update feed the dispatcher consumes. All formatting
//! quirks of the platform (HTML parse mode, inline keyboard shape, protected
//! content) stay behind this crate.

mod bot;
mod format;
mod types;

pub use bot::{TelegramBot, TelegramConfig};
pub use format::render_html;
pub use types::{CallbackQuery, Chat, IncomingMessage, IncomingUser, IncomingVideo, Update};
