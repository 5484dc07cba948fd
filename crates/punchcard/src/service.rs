//! The stamp service: issuance, redemption, and status over the ledger.
//!
//! Callers arrive already authenticated; the HTTP layer hands this
//! service validated identifiers and raw token strings, never requests.

use std::sync::Arc;

use punchcard_core::{
    stamps_in_range, BusinessId, CustomerId, QrClaims, RedemptionId, RedemptionRecord,
    RedemptionSource, TokenCodec, AUDIENCE_QR_SCAN,
};
use punchcard_store::{Ledger, RecordOutcome};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::pending::{PendingEntry, PendingIssuances};

/// A freshly minted stamp QR.
///
/// The token string is what gets rendered as a QR image (elsewhere);
/// the redemption id is returned separately so the business can poll
/// [`StampService::check_status`] without decoding its own token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQr {
    /// The opaque signed token string.
    pub token: String,

    /// The token's single-use redemption key.
    pub redemption_id: RedemptionId,

    /// Mint time, unix seconds.
    pub issued_at: i64,

    /// Expiry, unix seconds (`issued_at + 30`).
    pub expires_at: i64,
}

/// Answer to a status poll for an issued QR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionStatus {
    /// Issued, unconsumed, and still inside its validity window.
    Pending,
    /// A redemption record exists for this id.
    Redeemed,
    /// No record exists and the validity window has lapsed (or the id
    /// is unknown, which is indistinguishable once the window is gone).
    Expired,
}

/// The main service struct, generic over the ledger backend.
///
/// Issuance touches only the codec and the pending tracker; redemption
/// is the single mutating hot path and delegates its atomicity to the
/// ledger; status is read-only.
pub struct StampService<L: Ledger> {
    codec: TokenCodec,
    ledger: Arc<L>,
    pending: PendingIssuances,
}

impl<L: Ledger> StampService<L> {
    /// Create a service instance from configuration and a ledger.
    pub fn new(config: &ServiceConfig, ledger: L) -> Self {
        Self {
            codec: TokenCodec::new(config.token_key()),
            ledger: Arc::new(ledger),
            pending: PendingIssuances::new(),
        }
    }

    /// Get the ledger reference.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ─────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────

    /// Mint a stamp QR for `business` worth `stamps` stamps, with an
    /// explicit clock (unix seconds).
    ///
    /// Pure minting: the ledger is not touched. The redemption id is
    /// registered with the pending tracker so status polls can tell
    /// "not yet" from "too late".
    pub fn issue_stamp_qr_at(
        &self,
        business: &BusinessId,
        stamps: u8,
        now: i64,
    ) -> Result<IssuedQr> {
        if !stamps_in_range(stamps) {
            return Err(ServiceError::InvalidStampCount(stamps));
        }

        let redemption_id = RedemptionId::generate_at(now * 1000);
        let claims = QrClaims::stamp_qr(business.clone(), stamps, redemption_id.clone(), now);
        let token = self.codec.encode(&claims);

        self.pending.insert(
            redemption_id.clone(),
            PendingEntry {
                business_id: business.clone(),
                issued_at: claims.issued_at,
                expires_at: claims.expires_at,
            },
            now,
        );

        tracing::debug!(%business, stamps, %redemption_id, "issued stamp QR");

        Ok(IssuedQr {
            token,
            redemption_id,
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        })
    }

    /// Mint a stamp QR against the wall clock.
    pub fn issue_stamp_qr(&self, business: &BusinessId, stamps: u8) -> Result<IssuedQr> {
        self.issue_stamp_qr_at(business, stamps, now_secs())
    }

    // ─────────────────────────────────────────────────────────────────
    // Redemption
    // ─────────────────────────────────────────────────────────────────

    /// Consume a token for `customer`, with an explicit clock.
    ///
    /// At most one call per token can ever succeed: the ledger's unique
    /// key on the redemption id decides the winner among racing calls,
    /// and the losers get [`ServiceError::AlreadyRedeemed`]. On success
    /// the record insert and the balance update land atomically.
    pub async fn redeem_at(
        &self,
        token: &str,
        customer: &CustomerId,
        now: i64,
    ) -> Result<RedemptionRecord> {
        let claims = self.codec.decode_at(token, now)?;

        if claims.audience != AUDIENCE_QR_SCAN {
            return Err(ServiceError::InvalidTokenType {
                expected: AUDIENCE_QR_SCAN.to_owned(),
                got: claims.audience,
            });
        }

        // The codec already enforced the envelope expiry; re-check the
        // embedded claim so a codec regression cannot widen the window.
        if claims.is_expired(now) {
            return Err(ServiceError::Token(punchcard_core::TokenError::Expired {
                expires_at: claims.expires_at,
                now,
            }));
        }

        let record = RedemptionRecord {
            redemption_id: claims.redemption_id,
            business_id: claims.business_id,
            customer_id: customer.clone(),
            stamps_awarded: claims.stamps_value,
            source: RedemptionSource::QrScan,
            notes: None,
            created_at: now,
        };

        match self.ledger.record_redemption(&record).await? {
            RecordOutcome::Recorded { balance } => {
                self.pending.remove(&record.redemption_id);
                tracing::debug!(
                    redemption_id = %record.redemption_id,
                    customer = %record.customer_id,
                    stamps = record.stamps_awarded,
                    total = balance.total_stamps,
                    "redeemed stamp QR"
                );
                Ok(record)
            }
            RecordOutcome::DuplicateKey => {
                tracing::warn!(
                    redemption_id = %record.redemption_id,
                    customer = %record.customer_id,
                    "replay attempt on consumed token"
                );
                Err(ServiceError::AlreadyRedeemed(record.redemption_id))
            }
        }
    }

    /// Consume a token against the wall clock.
    pub async fn redeem(&self, token: &str, customer: &CustomerId) -> Result<RedemptionRecord> {
        self.redeem_at(token, customer, now_secs()).await
    }

    // ─────────────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────────────

    /// Poll the fate of an issued QR, with an explicit clock.
    ///
    /// Read-only; never consumes the token. Ids owned by a different
    /// business answer with `NotAuthorized` whether redeemed or still
    /// pending.
    pub async fn check_status_at(
        &self,
        business: &BusinessId,
        redemption_id: &RedemptionId,
        now: i64,
    ) -> Result<RedemptionStatus> {
        if let Some(record) = self.ledger.redemption(redemption_id).await? {
            if record.business_id == *business {
                return Ok(RedemptionStatus::Redeemed);
            }
            return Err(ServiceError::NotAuthorized);
        }

        if let Some(entry) = self.pending.get(redemption_id, now) {
            if entry.business_id == *business {
                return Ok(RedemptionStatus::Pending);
            }
            return Err(ServiceError::NotAuthorized);
        }

        Ok(RedemptionStatus::Expired)
    }

    /// Poll the fate of an issued QR against the wall clock.
    pub async fn check_status(
        &self,
        business: &BusinessId,
        redemption_id: &RedemptionId,
    ) -> Result<RedemptionStatus> {
        self.check_status_at(business, redemption_id, now_secs()).await
    }

    // ─────────────────────────────────────────────────────────────────
    // Direct grants
    // ─────────────────────────────────────────────────────────────────

    /// Award stamps without a token (manual or promotional), with an
    /// explicit clock.
    ///
    /// Writes the same ledger record a redemption would, under a fresh
    /// redemption id; the `qr_scan` source is reserved for the token
    /// path and rejected here.
    pub async fn grant_stamps_at(
        &self,
        business: &BusinessId,
        customer: &CustomerId,
        stamps: u8,
        source: RedemptionSource,
        notes: Option<String>,
        now: i64,
    ) -> Result<RedemptionRecord> {
        if !stamps_in_range(stamps) {
            return Err(ServiceError::InvalidStampCount(stamps));
        }
        if source == RedemptionSource::QrScan {
            return Err(ServiceError::InvalidGrantSource);
        }

        let record = RedemptionRecord {
            redemption_id: RedemptionId::generate_at(now * 1000),
            business_id: business.clone(),
            customer_id: customer.clone(),
            stamps_awarded: stamps,
            source,
            notes,
            created_at: now,
        };

        match self.ledger.record_redemption(&record).await? {
            RecordOutcome::Recorded { .. } => Ok(record),
            RecordOutcome::DuplicateKey => {
                Err(ServiceError::AlreadyRedeemed(record.redemption_id))
            }
        }
    }

    /// Award stamps without a token against the wall clock.
    pub async fn grant_stamps(
        &self,
        business: &BusinessId,
        customer: &CustomerId,
        stamps: u8,
        source: RedemptionSource,
        notes: Option<String>,
    ) -> Result<RedemptionRecord> {
        self.grant_stamps_at(business, customer, stamps, source, notes, now_secs())
            .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use punchcard_core::{TokenError, QR_TTL_SECS};
    use punchcard_store::MemoryLedger;

    const NOW: i64 = 1_700_000_000;

    fn service() -> (ServiceConfig, StampService<MemoryLedger>) {
        let config = ServiceConfig::new([9u8; 32]);
        let service = StampService::new(&config, MemoryLedger::new());
        (config, service)
    }

    #[test]
    fn test_issue_claims_match_inputs() {
        let (config, service) = service();
        let business = BusinessId::from("biz_1");

        let issued = service.issue_stamp_qr_at(&business, 3, NOW).unwrap();
        assert_eq!(issued.expires_at - issued.issued_at, QR_TTL_SECS);

        let codec = TokenCodec::new(config.token_key());
        let claims = codec.decode_at(&issued.token, NOW).unwrap();
        assert_eq!(claims.business_id, business);
        assert_eq!(claims.stamps_value, 3);
        assert_eq!(claims.redemption_id, issued.redemption_id);
        assert_eq!(claims.issued_at, NOW);
        assert_eq!(claims.expires_at, NOW + QR_TTL_SECS);
    }

    #[test]
    fn test_issue_rejects_out_of_range_stamps() {
        let (_, service) = service();
        let business = BusinessId::from("biz_1");
        for stamps in [0u8, 11, 200] {
            assert!(matches!(
                service.issue_stamp_qr_at(&business, stamps, NOW),
                Err(ServiceError::InvalidStampCount(s)) if s == stamps
            ));
        }
    }

    #[tokio::test]
    async fn test_redeem_then_replay() {
        let (_, service) = service();
        let business = BusinessId::from("biz_1");
        let customer = CustomerId::from("cust_9");

        let issued = service.issue_stamp_qr_at(&business, 3, NOW).unwrap();
        let record = service
            .redeem_at(&issued.token, &customer, NOW + 5)
            .await
            .unwrap();
        assert_eq!(record.redemption_id, issued.redemption_id);
        assert_eq!(record.stamps_awarded, 3);
        assert_eq!(record.source, RedemptionSource::QrScan);

        let replay = service.redeem_at(&issued.token, &customer, NOW + 6).await;
        assert!(matches!(
            replay,
            Err(ServiceError::AlreadyRedeemed(id)) if id == issued.redemption_id
        ));

        let balance = service.ledger().balance(&customer).await.unwrap().unwrap();
        assert_eq!(balance.total_stamps, 3);
        assert_eq!(balance.total_visits, 1);
    }

    #[tokio::test]
    async fn test_redeem_expired() {
        let (_, service) = service();
        let issued = service
            .issue_stamp_qr_at(&BusinessId::from("biz_1"), 3, NOW)
            .unwrap();

        let result = service
            .redeem_at(&issued.token, &CustomerId::from("cust_9"), NOW + 31)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Token(TokenError::Expired { .. }))
        ));
    }

    #[tokio::test]
    async fn test_redeem_rejects_wrong_audience() {
        let (config, service) = service();
        let codec = TokenCodec::new(config.token_key());

        let mut claims = QrClaims::stamp_qr(
            BusinessId::from("biz_1"),
            3,
            RedemptionId::generate_at(NOW * 1000),
            NOW,
        );
        claims.audience = "session".to_owned();
        let token = codec.encode(&claims);

        let result = service
            .redeem_at(&token, &CustomerId::from("cust_9"), NOW + 1)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidTokenType { got, .. }) if got == "session"
        ));
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let (_, service) = service();
        let business = BusinessId::from("biz_1");
        let customer = CustomerId::from("cust_9");

        let issued = service.issue_stamp_qr_at(&business, 2, NOW).unwrap();
        let id = &issued.redemption_id;

        assert_eq!(
            service.check_status_at(&business, id, NOW + 5).await.unwrap(),
            RedemptionStatus::Pending
        );

        service.redeem_at(&issued.token, &customer, NOW + 10).await.unwrap();
        assert_eq!(
            service.check_status_at(&business, id, NOW + 11).await.unwrap(),
            RedemptionStatus::Redeemed
        );

        // An unredeemed QR lapses into Expired.
        let lapsed = service.issue_stamp_qr_at(&business, 2, NOW).unwrap();
        assert_eq!(
            service
                .check_status_at(&business, &lapsed.redemption_id, NOW + 31)
                .await
                .unwrap(),
            RedemptionStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_status_cross_business() {
        let (_, service) = service();
        let issuer = BusinessId::from("biz_1");
        let other = BusinessId::from("biz_2");
        let customer = CustomerId::from("cust_9");

        let issued = service.issue_stamp_qr_at(&issuer, 2, NOW).unwrap();
        assert!(matches!(
            service
                .check_status_at(&other, &issued.redemption_id, NOW + 1)
                .await,
            Err(ServiceError::NotAuthorized)
        ));

        service.redeem_at(&issued.token, &customer, NOW + 5).await.unwrap();
        assert!(matches!(
            service
                .check_status_at(&other, &issued.redemption_id, NOW + 6)
                .await,
            Err(ServiceError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_unknown_id_reads_expired() {
        let (_, service) = service();
        assert_eq!(
            service
                .check_status_at(&BusinessId::from("biz_1"), &RedemptionId::new("r_nope"), NOW)
                .await
                .unwrap(),
            RedemptionStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_grant_stamps() {
        let (_, service) = service();
        let business = BusinessId::from("biz_1");
        let customer = CustomerId::from("cust_9");

        let record = service
            .grant_stamps_at(
                &business,
                &customer,
                5,
                RedemptionSource::Manual,
                Some("birthday visit".to_owned()),
                NOW,
            )
            .await
            .unwrap();
        assert_eq!(record.source, RedemptionSource::Manual);
        assert_eq!(record.notes.as_deref(), Some("birthday visit"));

        let balance = service.ledger().balance(&customer).await.unwrap().unwrap();
        assert_eq!(balance.total_stamps, 5);

        assert!(matches!(
            service
                .grant_stamps_at(&business, &customer, 5, RedemptionSource::QrScan, None, NOW)
                .await,
            Err(ServiceError::InvalidGrantSource)
        ));
        assert!(matches!(
            service
                .grant_stamps_at(&business, &customer, 0, RedemptionSource::Manual, None, NOW)
                .await,
            Err(ServiceError::InvalidStampCount(0))
        ));
    }
}
