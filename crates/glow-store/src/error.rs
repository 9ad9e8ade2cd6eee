//! Store Error Types

use thiserror::Error;

/// Storage-layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Unique-key violation surfaced to the caller (e.g. a charge id
    /// inserted twice); first-contact races on the user table are absorbed
    /// by the upsert and never produce this
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// A persisted value no longer parses into its domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
