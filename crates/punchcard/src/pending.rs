//! Tracking of outstanding, not-yet-consumed issuances.
//!
//! The ledger only knows about successful redemptions, so answering
//! "is this QR still pending?" needs a second source: a bounded
//! in-process map of issued redemption ids with the same 30-second
//! lifetime as the tokens themselves. Entries are registered at
//! issuance, removed on redemption, and swept once expired, so the map
//! never outgrows the issuance rate of one TTL window.
//!
//! The map is not persisted. After a restart, outstanding ids read as
//! expired - and within one TTL of the restart a still-live token
//! briefly reads as expired too, which errs on the side the business
//! can recover from (reissue the QR).

use std::collections::HashMap;
use std::sync::Mutex;

use punchcard_core::{BusinessId, RedemptionId};

/// One outstanding issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// The business that minted the QR.
    pub business_id: BusinessId,

    /// Mint time, unix seconds.
    pub issued_at: i64,

    /// Expiry, unix seconds.
    pub expires_at: i64,
}

/// Self-expiring map of outstanding issuances.
pub struct PendingIssuances {
    inner: Mutex<HashMap<RedemptionId, PendingEntry>>,
}

impl PendingIssuances {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register an issuance and sweep entries already expired at `now`.
    pub fn insert(&self, id: RedemptionId, entry: PendingEntry, now: i64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.retain(|_, e| now <= e.expires_at);
        inner.insert(id, entry);
    }

    /// Look up an issuance still live at `now`.
    pub fn get(&self, id: &RedemptionId, now: i64) -> Option<PendingEntry> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(id).filter(|e| now <= e.expires_at).cloned()
    }

    /// Drop an issuance (after its token was consumed).
    pub fn remove(&self, id: &RedemptionId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.remove(id);
    }

    /// Number of tracked entries, expired or not.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingIssuances {
    fn default() -> Self {
        Self::new()
    }
}
