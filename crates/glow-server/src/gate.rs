//! Access Gate
//!
//! Runs ahead of every inbound update: resolves (or lazily creates) the
//! account for the sender and hands it to the handler. The store's upsert
//! guarantees concurrent first-contacts collapse into one row.

use glow_core::{ProfileHints, User, UserId};
use glow_store::{LedgerStore, StoreError};
use glow_telegram::IncomingUser;

/// Load-or-create the account behind an incoming update
pub async fn ensure_user(
    store: &dyn LedgerStore,
    from: &IncomingUser,
) -> Result<User, StoreError> {
    let hints = ProfileHints {
        username: from.username.clone(),
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone(),
    };
    store.ensure_user(UserId(from.id), &hints).await
}
