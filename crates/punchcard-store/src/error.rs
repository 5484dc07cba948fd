//! Error types for the ledger storage.

use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// A duplicate `redemption_id` is not an error: backends report it as
/// [`crate::RecordOutcome::DuplicateKey`] so callers never have to match
/// on vendor-specific constraint codes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, StoreError>;
