//! Service configuration.
//!
//! The signing key is explicit configuration handed to the service at
//! construction, not ambient global state: two services with different
//! seeds are fully independent token namespaces, and tests can run any
//! number of them side by side.

use punchcard_core::TokenKey;

use crate::error::{Result, ServiceError};

/// Environment variable holding the hex-encoded 32-byte signing seed.
pub const SIGNING_KEY_ENV: &str = "PUNCHCARD_SIGNING_KEY";

/// Configuration for the stamp service.
#[derive(Clone)]
pub struct ServiceConfig {
    signing_seed: [u8; 32],
}

impl ServiceConfig {
    /// Build from a raw 32-byte signing seed.
    pub fn new(signing_seed: [u8; 32]) -> Self {
        Self { signing_seed }
    }

    /// Build from a hex-encoded 32-byte seed.
    pub fn from_hex_seed(hex_seed: &str) -> Result<Self> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| ServiceError::Configuration(format!("signing key is not hex: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ServiceError::Configuration(format!(
                "signing key must be 32 bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self::new(seed))
    }

    /// Build from the process environment.
    ///
    /// Fails fast with a configuration error when the variable is absent
    /// or garbled; a service without a key must not start.
    pub fn from_env() -> Result<Self> {
        let hex_seed = std::env::var(SIGNING_KEY_ENV).map_err(|_| {
            ServiceError::Configuration(format!("{} is not set", SIGNING_KEY_ENV))
        })?;
        Self::from_hex_seed(&hex_seed)
    }

    /// Generate a throwaway config with a random key.
    ///
    /// For tests and local development; tokens do not survive restarts.
    pub fn ephemeral() -> Self {
        Self::new(TokenKey::generate().seed())
    }

    /// The signing key this config describes.
    pub fn token_key(&self) -> TokenKey {
        TokenKey::from_seed(&self.signing_seed)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print seed material.
        f.debug_struct("ServiceConfig")
            .field("public_key", &self.token_key().public_key())
            .finish()
    }
}
