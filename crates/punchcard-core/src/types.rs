//! Strong identifier types for the loyalty ledger.
//!
//! Business and customer identifiers are minted by the external auth
//! layer and treated as opaque here; newtypes keep them from being
//! swapped at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a business account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub String);

impl BusinessId {
    /// Create from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a customer account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    /// Create from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The anti-replay key of a single stamp award.
///
/// Minted once at issuance time: a 48-bit unix-millisecond prefix plus a
/// 64-bit random suffix, hex encoded. Collisions are astronomically
/// unlikely; the ledger's unique index is the actual guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedemptionId(pub String);

impl RedemptionId {
    /// Generate a fresh id for the given mint time (unix milliseconds).
    pub fn generate_at(now_ms: i64) -> Self {
        let prefix = (now_ms as u64) & 0xffff_ffff_ffff;
        let suffix: u64 = rand::random();
        Self(format!("r_{:012x}{:016x}", prefix, suffix))
    }

    /// Generate a fresh id using the wall clock.
    pub fn generate() -> Self {
        Self::generate_at(now_millis())
    }

    /// Create from an existing string (e.g. read back from storage).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a redemption entered the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedemptionSource {
    /// A signed QR token was scanned and consumed.
    QrScan,
    /// A business granted stamps directly.
    Manual,
    /// A promotional award.
    Promotion,
}

impl RedemptionSource {
    /// Stable text form, used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QrScan => "qr_scan",
            Self::Manual => "manual",
            Self::Promotion => "promotion",
        }
    }

    /// Try to parse from the stable text form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qr_scan" => Some(Self::QrScan),
            "manual" => Some(Self::Manual),
            "promotion" => Some(Self::Promotion),
            _ => None,
        }
    }
}

impl fmt::Display for RedemptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
