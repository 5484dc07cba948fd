//! # Punchcard Core
//!
//! Pure primitives for the punchcard loyalty backend: identifiers,
//! token claims, the signed QR codec, and persistent record types.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over signed data.
//!
//! ## Key Types
//!
//! - [`QrClaims`] - The claims carried inside a stamp-QR token
//! - [`TokenCodec`] - Encodes, decodes, and verifies token strings
//! - [`RedemptionId`] - Single-use anti-replay key minted at issuance
//! - [`RedemptionRecord`] / [`StampBalance`] - The ledger's record types
//!
//! ## Canonicalization
//!
//! Claims are encoded as deterministic CBOR before signing. See the
//! [`canonical`] module.

pub mod canonical;
pub mod claims;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod record;
pub mod types;

pub use canonical::{canonical_claims_bytes, claims_from_canonical, signed_message, SIGN_DOMAIN};
pub use claims::{
    stamps_in_range, QrClaims, AUDIENCE_QR_SCAN, MAX_STAMPS, MIN_STAMPS, QR_TTL_SECS,
    TOKEN_ISSUER, TOKEN_VERSION,
};
pub use codec::TokenCodec;
pub use crypto::{TokenKey, TokenPublicKey, TokenSignature};
pub use error::TokenError;
pub use record::{RedemptionRecord, StampBalance};
pub use types::{BusinessId, CustomerId, RedemptionId, RedemptionSource};
