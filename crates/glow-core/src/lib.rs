//! # glow-core
//!
//! Domain model and messaging abstractions for the glow-bot sales funnel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        glow-core                             │
//! │  ┌────────────┐  ┌─────────────┐  ┌───────────────────────┐  │
//! │  │   Domain   │  │   Content   │  │    ChatGateway        │  │
//! │  │ User/Tier/ │  │   Catalog   │  │    (Strategy)         │  │
//! │  │  Attempt   │  │             │  │                       │  │
//! │  └────────────┘  └─────────────┘  └───────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatGateway` trait decouples everything above it (payment workflow,
//! dispatcher, drip scheduler) from the concrete messenger, so the Telegram
//! client can be swapped for a mock in tests without touching business logic.

pub mod attempt;
pub mod chat;
pub mod content;
pub mod error;
pub mod tier;
pub mod user;

pub use attempt::{PaymentAttempt, PaymentStatus};
pub use chat::{ChatGateway, ChatId, InlineButton, InlineKeyboard, MediaRef};
pub use content::{ContentStore, MessageCatalog};
pub use error::{CoreError, Result};
pub use tier::Tier;
pub use user::{ProfileHints, User, UserId};
