//! In-memory implementation of the Ledger trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use punchcard_core::{
    BusinessId, CustomerId, RedemptionId, RedemptionRecord, StampBalance,
};

use crate::error::{Result, StoreError};
use crate::traits::{Ledger, RecordOutcome};

/// In-memory ledger implementation.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock;
/// holding the write lock across the duplicate check and the balance
/// update gives the same atomicity as the SQLite transaction.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

struct MemoryLedgerInner {
    /// Records indexed by their unique redemption id.
    records: HashMap<RedemptionId, RedemptionRecord>,

    /// Per-customer aggregates.
    balances: HashMap<CustomerId, StampBalance>,
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner {
                records: HashMap::new(),
                balances: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(format!("ledger lock poisoned: {}", e))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn record_redemption(&self, record: &RedemptionRecord) -> Result<RecordOutcome> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        if inner.records.contains_key(&record.redemption_id) {
            return Ok(RecordOutcome::DuplicateKey);
        }

        inner
            .records
            .insert(record.redemption_id.clone(), record.clone());

        let balance = inner
            .balances
            .entry(record.customer_id.clone())
            .or_insert_with(|| StampBalance::empty(record.customer_id.clone()));
        balance.apply(record.stamps_awarded, record.created_at);

        Ok(RecordOutcome::Recorded {
            balance: balance.clone(),
        })
    }

    async fn redemption(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.get(id).cloned())
    }

    async fn balance(&self, customer: &CustomerId) -> Result<Option<StampBalance>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.balances.get(customer).cloned())
    }

    async fn redemptions_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<RedemptionRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut records: Vec<_> = inner
            .records
            .values()
            .filter(|r| &r.customer_id == customer)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.redemption_id.as_str().cmp(b.redemption_id.as_str()))
        });
        Ok(records)
    }

    async fn redemptions_for_business(
        &self,
        business: &BusinessId,
        limit: u32,
    ) -> Result<Vec<RedemptionRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut records: Vec<_> = inner
            .records
            .values()
            .filter(|r| &r.business_id == business)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.redemption_id.as_str().cmp(b.redemption_id.as_str()))
        });
        records.truncate(limit as usize);
        Ok(records)
    }
}
