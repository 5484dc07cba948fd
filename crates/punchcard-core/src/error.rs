//! Error types for punchcard-core.

use thiserror::Error;

/// Errors produced while encoding, decoding, or verifying a QR token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token string or its claims payload could not be parsed.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not verify against the issuing key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token's validity window has elapsed.
    #[error("token expired at {expires_at}, now {now}")]
    Expired { expires_at: i64, now: i64 },
}

/// Result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
