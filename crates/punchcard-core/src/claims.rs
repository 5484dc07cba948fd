//! The claims carried inside a signed stamp-QR token.
//!
//! A token is ephemeral: it is never persisted as a record, only encoded,
//! displayed, and (at most once) consumed. Expiry is tracked twice by
//! design: the codec enforces `expires_at` as the envelope expiry, and
//! the redemption path re-checks the same field explicitly.

use serde::{Deserialize, Serialize};

use crate::types::{BusinessId, RedemptionId};

/// The current claims schema version.
pub const TOKEN_VERSION: u8 = 0;

/// Issuer tag embedded in every token.
pub const TOKEN_ISSUER: &str = "punchcard";

/// Audience tag for stamp-QR tokens.
pub const AUDIENCE_QR_SCAN: &str = "qr-scan";

/// Fixed validity window of a stamp QR, in seconds.
///
/// Deliberately short: a displayed QR code is a bearer credential, and
/// 30 seconds bounds the exposure window if it is photographed or shared.
pub const QR_TTL_SECS: i64 = 30;

/// Smallest stamp award a single QR may carry.
pub const MIN_STAMPS: u8 = 1;

/// Largest stamp award a single QR may carry.
pub const MAX_STAMPS: u8 = 10;

/// Claims payload of a stamp-QR token.
///
/// The signature covers the canonical encoding of the whole struct, so
/// no field can be altered without invalidating the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrClaims {
    /// Claims schema version (currently 0).
    pub version: u8,

    /// Issuer tag, always [`TOKEN_ISSUER`].
    pub issuer: String,

    /// Audience tag; [`AUDIENCE_QR_SCAN`] for stamp QRs.
    pub audience: String,

    /// The business the stamps will be debited against.
    pub business_id: BusinessId,

    /// Number of stamps awarded on redemption, in [1, 10].
    pub stamps_value: u8,

    /// Single-use anti-replay key.
    pub redemption_id: RedemptionId,

    /// Mint time, unix seconds.
    pub issued_at: i64,

    /// Expiry, unix seconds; always `issued_at + 30`.
    pub expires_at: i64,
}

impl QrClaims {
    /// Build the claims for a stamp QR minted at `issued_at` (unix seconds).
    pub fn stamp_qr(
        business_id: BusinessId,
        stamps_value: u8,
        redemption_id: RedemptionId,
        issued_at: i64,
    ) -> Self {
        Self {
            version: TOKEN_VERSION,
            issuer: TOKEN_ISSUER.to_owned(),
            audience: AUDIENCE_QR_SCAN.to_owned(),
            business_id,
            stamps_value,
            redemption_id,
            issued_at,
            expires_at: issued_at + QR_TTL_SECS,
        }
    }

    /// Check whether the claims have expired at `now` (unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

/// Check a stamp count against the [1, 10] issuance bound.
pub fn stamps_in_range(stamps: u8) -> bool {
    (MIN_STAMPS..=MAX_STAMPS).contains(&stamps)
}
