//! Persistent ledger records.
//!
//! A [`RedemptionRecord`] is written exactly once and never mutated or
//! deleted; the ledger is append-only. [`StampBalance`] is the derived
//! per-customer aggregate, updated only inside the same transaction that
//! inserts the record.

use serde::{Deserialize, Serialize};

use crate::types::{BusinessId, CustomerId, RedemptionId, RedemptionSource};

/// One successful stamp award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    /// Unique anti-replay key; the ledger enforces exactly-once on it.
    pub redemption_id: RedemptionId,

    /// The business the stamps were issued by.
    pub business_id: BusinessId,

    /// The customer who received the stamps.
    pub customer_id: CustomerId,

    /// Stamps awarded, in [1, 10].
    pub stamps_awarded: u8,

    /// How the award entered the ledger.
    pub source: RedemptionSource,

    /// Optional free-form note (manual grants mostly).
    pub notes: Option<String>,

    /// When the record was written, unix seconds.
    pub created_at: i64,
}

/// Per-customer stamp aggregate.
///
/// Invariant: `total_stamps` equals the sum of `stamps_awarded` over the
/// customer's redemption records (reward debits are out of scope here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampBalance {
    /// The customer this balance belongs to.
    pub customer_id: CustomerId,

    /// Total stamps accrued.
    pub total_stamps: u64,

    /// Number of recorded visits (one per redemption).
    pub total_visits: u64,

    /// Last redemption time, unix seconds.
    pub last_visit: i64,
}

impl StampBalance {
    /// A zeroed balance for a customer with no redemptions yet.
    pub fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            total_stamps: 0,
            total_visits: 0,
            last_visit: 0,
        }
    }

    /// Fold one redemption into the balance.
    pub fn apply(&mut self, stamps_awarded: u8, at: i64) {
        self.total_stamps += stamps_awarded as u64;
        self.total_visits += 1;
        self.last_visit = at;
    }
}
