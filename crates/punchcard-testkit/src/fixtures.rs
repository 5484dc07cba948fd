//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use punchcard_core::{
    BusinessId, CustomerId, QrClaims, RedemptionId, RedemptionRecord, RedemptionSource, TokenCodec,
    TokenKey,
};
use punchcard_store::MemoryLedger;

/// A fixed "now" most fixture tokens are minted at (unix seconds).
pub const FIXTURE_NOW: i64 = 1_700_000_000;

/// A test fixture with a deterministic codec and an in-memory ledger.
pub struct TestFixture {
    pub key: TokenKey,
    pub codec: TokenCodec,
    pub ledger: MemoryLedger,
}

impl TestFixture {
    /// Create a fixture with a fixed seed, so tokens are reproducible.
    pub fn new() -> Self {
        Self::with_seed([0xabu8; 32])
    }

    /// Create with a specific keypair seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let key = TokenKey::from_seed(&seed);
        Self {
            codec: TokenCodec::new(key.clone()),
            key,
            ledger: MemoryLedger::new(),
        }
    }

    /// Build stamp-QR claims minted at [`FIXTURE_NOW`].
    pub fn make_claims(&self, business: &str, stamps: u8) -> QrClaims {
        QrClaims::stamp_qr(
            BusinessId::from(business),
            stamps,
            RedemptionId::generate_at(FIXTURE_NOW * 1000),
            FIXTURE_NOW,
        )
    }

    /// Build and encode a stamp-QR token minted at [`FIXTURE_NOW`].
    pub fn make_token(&self, business: &str, stamps: u8) -> (String, QrClaims) {
        let claims = self.make_claims(business, stamps);
        (self.codec.encode(&claims), claims)
    }

    /// Build a redemption record as the redeem path would from `claims`.
    pub fn make_record(&self, claims: &QrClaims, customer: &str, at: i64) -> RedemptionRecord {
        RedemptionRecord {
            redemption_id: claims.redemption_id.clone(),
            business_id: claims.business_id.clone(),
            customer_id: CustomerId::from(customer),
            stamps_awarded: claims.stamps_value,
            source: RedemptionSource::QrScan,
            notes: None,
            created_at: at,
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use punchcard_store::{Ledger, RecordOutcome};

    #[test]
    fn test_fixture_tokens_decode() {
        let fixture = TestFixture::new();
        let (token, claims) = fixture.make_token("biz_1", 3);
        let decoded = fixture.codec.decode_at(&token, FIXTURE_NOW + 1).unwrap();
        assert_eq!(decoded, claims);
    }

    #[tokio::test]
    async fn test_fixture_ledger_records() {
        let fixture = TestFixture::new();
        let claims = fixture.make_claims("biz_1", 3);
        let record = fixture.make_record(&claims, "cust_9", FIXTURE_NOW + 2);

        let outcome = fixture.ledger.record_redemption(&record).await.unwrap();
        assert!(matches!(outcome, RecordOutcome::Recorded { .. }));
    }
}
