//! # glow-store
//!
//! Durable record of user accounts and payment attempts, plus the small
//! amount of admin state (uploaded media, upload sessions) the funnel needs.
//! Pure persistence: every business rule about *when* a status may change
//! lives in `glow-payments`; this crate only guarantees *how* — uniqueness of
//! keys, monotonicity of terminal statuses, and atomicity of the conditional
//! update both backends expose through [`LedgerStore::advance_status`].
//!
//! Two implementations:
//! - [`MemoryStore`] — mutex-guarded maps, for tests and development
//! - [`PgStore`] — Postgres via sqlx with embedded migrations

mod error;
mod ledger;
mod memory;
mod postgres;

pub use error::StoreError;
pub use ledger::{AdminStore, LedgerStore, VideoAsset};
pub use memory::MemoryStore;
pub use postgres::PgStore;
