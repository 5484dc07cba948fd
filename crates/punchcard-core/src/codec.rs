//! The signed token codec.
//!
//! A token string is `hex(canonical_claims || signature)`, where the
//! signature is Ed25519 over `SIGN_DOMAIN || canonical_claims`. Hex keeps
//! the string URL-safe and trivially embeddable in a QR code.
//!
//! The codec is pure: given the same key, input, and clock it always
//! produces the same result and touches nothing else.

use crate::canonical::{canonical_claims_bytes, claims_from_canonical, signed_message};
use crate::claims::{QrClaims, TOKEN_VERSION};
use crate::crypto::{TokenKey, TokenSignature};
use crate::error::TokenError;

/// Encodes and verifies signed QR tokens with a process-wide key.
///
/// Constructed from explicit key material (see the service configuration)
/// rather than ambient global state, so tests and multi-tenant setups can
/// run independently keyed codecs side by side.
#[derive(Clone)]
pub struct TokenCodec {
    key: TokenKey,
}

impl TokenCodec {
    /// Create a codec over the given signing key.
    pub fn new(key: TokenKey) -> Self {
        Self { key }
    }

    /// Encode and sign claims into a token string.
    pub fn encode(&self, claims: &QrClaims) -> String {
        let claims_bytes = canonical_claims_bytes(claims);
        let signature = self.key.sign(&signed_message(&claims_bytes));

        let mut raw = claims_bytes;
        raw.extend_from_slice(&signature.0);
        hex::encode(raw)
    }

    /// Decode a token, verifying signature and expiry against `now`
    /// (unix seconds).
    ///
    /// The signature is checked before expiry, so a tampered token is
    /// reported as invalid rather than expired regardless of its
    /// embedded timestamps.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<QrClaims, TokenError> {
        let raw = hex::decode(token).map_err(|_| TokenError::Malformed("not hex".into()))?;

        // Smallest possible claims map is well over one byte; anything
        // that cannot even hold a signature is garbage.
        if raw.len() <= 64 {
            return Err(TokenError::Malformed("token too short".into()));
        }

        let (claims_bytes, sig_bytes) = raw.split_at(raw.len() - 64);
        let sig_bytes: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| TokenError::Malformed("invalid signature length".into()))?;
        let signature = TokenSignature::from_bytes(sig_bytes);

        self.key
            .public_key()
            .verify(&signed_message(claims_bytes), &signature)?;

        let claims = claims_from_canonical(claims_bytes)?;

        if claims.version != TOKEN_VERSION {
            return Err(TokenError::Malformed(format!(
                "unsupported claims version: {}",
                claims.version
            )));
        }

        if claims.is_expired(now) {
            return Err(TokenError::Expired {
                expires_at: claims.expires_at,
                now,
            });
        }

        Ok(claims)
    }

    /// Decode a token against the wall clock.
    pub fn decode(&self, token: &str) -> Result<QrClaims, TokenError> {
        self.decode_at(token, now_secs())
    }
}

/// Get current time in seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
