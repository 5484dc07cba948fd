//! Error types for the stamp service.

use punchcard_core::{RedemptionId, TokenError};
use punchcard_store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
///
/// Every variant is surfaced to the HTTP layer unmodified; translation
/// into responses happens there, never here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or unusable signing-key configuration. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token failure: malformed, bad signature, or expired.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The token verified but carries the wrong audience claim.
    #[error("invalid token type: expected audience {expected:?}, got {got:?}")]
    InvalidTokenType { expected: String, got: String },

    /// Stamp count outside the [1, 10] issuance bound.
    #[error("invalid stamp count: {0} (must be 1..=10)")]
    InvalidStampCount(u8),

    /// Manual grants cannot claim the qr_scan source.
    #[error("invalid grant source: qr_scan is reserved for token redemption")]
    InvalidGrantSource,

    /// The redemption id has already been consumed.
    #[error("already redeemed: {0}")]
    AlreadyRedeemed(RedemptionId),

    /// Cross-business access to a redemption.
    #[error("not authorized")]
    NotAuthorized,

    /// Underlying store failure; transaction rolled back, nothing
    /// partial persisted. Not retried here.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
