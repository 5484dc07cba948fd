//! Cryptographic primitives for QR token signing.
//!
//! Wraps Ed25519 signing with strong types. The service holds a single
//! process-wide [`TokenKey`]; tokens are both minted and verified with it.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TokenError;

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPublicKey(pub [u8; 32]);

impl TokenPublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &TokenSignature) -> Result<(), TokenError> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|_| TokenError::Malformed("invalid public key".into()))?;

        let sig = Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| TokenError::InvalidSignature)
    }
}

impl fmt::Debug for TokenPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenPub({})", &self.to_hex()[..16])
    }
}

/// A 64-byte Ed25519 signature over the canonical claims bytes.
///
/// Travels only inside the hex token string, never through serde.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSignature(pub [u8; 64]);

impl TokenSignature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TokenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for TokenSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The signing key for QR tokens.
///
/// This wraps ed25519-dalek's SigningKey. Loaded once from configuration
/// at startup; each key defines an independent token namespace, so two
/// services with different keys cannot redeem each other's tokens.
#[derive(Clone)]
pub struct TokenKey {
    signing_key: SigningKey,
}

impl TokenKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> TokenPublicKey {
        TokenPublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> TokenSignature {
        let sig = self.signing_key.sign(message);
        TokenSignature(sig.to_bytes())
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKey({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let key = TokenKey::generate();
        let message = b"qr claims";
        let signature = key.sign(message);

        key.public_key()
            .verify(message, &signature)
            .expect("valid signature should verify");

        let tampered = b"qr claimS";
        assert!(matches!(
            key.public_key().verify(tampered, &signature),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        let k1 = TokenKey::from_seed(&seed);
        let k2 = TokenKey::from_seed(&seed);
        assert_eq!(k1.public_key(), k2.public_key());
        assert_eq!(k1.seed(), seed);
    }

    #[test]
    fn test_independent_keys_do_not_cross_verify() {
        let k1 = TokenKey::generate();
        let k2 = TokenKey::generate();
        let signature = k1.sign(b"claims");
        assert!(k2.public_key().verify(b"claims", &signature).is_err());
    }
}
