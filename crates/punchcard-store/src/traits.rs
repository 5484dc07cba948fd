//! Ledger trait: the abstract interface for redemption persistence.
//!
//! This trait is what the service layer writes against. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use punchcard_core::{BusinessId, CustomerId, RedemptionId, RedemptionRecord, StampBalance};

use crate::error::Result;

/// Result of recording a redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record was written and the balance updated atomically.
    Recorded {
        /// The customer's balance after the update.
        balance: StampBalance,
    },
    /// A record with this `redemption_id` already exists; nothing was
    /// written. This is the anti-replay signal.
    DuplicateKey,
}

/// The Ledger trait: async interface for redemption persistence.
///
/// # Design Notes
///
/// - **Exclusive write ownership**: only `record_redemption` mutates
///   records and balances; everything else is read-only.
/// - **Atomicity**: `record_redemption` inserts the record and updates
///   the customer balance in one transaction. On any failure neither
///   side is visible.
/// - **Serialization point**: the unique index on `redemption_id` is
///   what turns N concurrent attempts on one token into exactly one
///   `Recorded` and N-1 `DuplicateKey`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Record a redemption and fold it into the customer's balance.
    ///
    /// Returns `DuplicateKey` (with no side effects) when the record's
    /// `redemption_id` has already been consumed.
    async fn record_redemption(&self, record: &RedemptionRecord) -> Result<RecordOutcome>;

    /// Look up a redemption record by its unique key.
    async fn redemption(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>>;

    /// Get a customer's stamp balance, if any redemption has been
    /// recorded for them.
    async fn balance(&self, customer: &CustomerId) -> Result<Option<StampBalance>>;

    /// All redemptions for a customer, newest first.
    async fn redemptions_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<RedemptionRecord>>;

    /// Recent redemptions for a business, newest first, at most `limit`.
    async fn redemptions_for_business(
        &self,
        business: &BusinessId,
        limit: u32,
    ) -> Result<Vec<RedemptionRecord>>;
}
