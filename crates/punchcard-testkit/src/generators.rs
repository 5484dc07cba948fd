//! Proptest generators for property-based testing.

use proptest::prelude::*;

use punchcard_core::{
    BusinessId, CustomerId, QrClaims, RedemptionId, TokenKey, MAX_STAMPS, MIN_STAMPS,
};

/// Generate a random signing key.
pub fn token_key() -> impl Strategy<Value = TokenKey> {
    any::<[u8; 32]>().prop_map(|seed| TokenKey::from_seed(&seed))
}

/// Generate a business identifier.
pub fn business_id() -> impl Strategy<Value = BusinessId> {
    "biz_[a-z0-9]{1,16}".prop_map(BusinessId::new)
}

/// Generate a customer identifier.
pub fn customer_id() -> impl Strategy<Value = CustomerId> {
    "cust_[a-z0-9]{1,16}".prop_map(CustomerId::new)
}

/// Generate a redemption id in the minted format.
pub fn redemption_id() -> impl Strategy<Value = RedemptionId> {
    (0i64..=0xffff_ffff_ffff, any::<u64>())
        .prop_map(|(ms, suffix)| RedemptionId::new(format!("r_{:012x}{:016x}", ms, suffix)))
}

/// Generate a valid stamp count.
pub fn stamps() -> impl Strategy<Value = u8> {
    MIN_STAMPS..=MAX_STAMPS
}

/// Generate a stamp count outside the issuance bound.
pub fn invalid_stamps() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0u8), (MAX_STAMPS + 1)..=u8::MAX]
}

/// Generate a plausible mint time (unix seconds).
pub fn issued_at() -> impl Strategy<Value = i64> {
    0i64..=4_000_000_000
}

/// Generate complete, valid stamp-QR claims.
pub fn qr_claims() -> impl Strategy<Value = QrClaims> {
    (business_id(), stamps(), redemption_id(), issued_at()).prop_map(
        |(business, stamps, redemption, at)| QrClaims::stamp_qr(business, stamps, redemption, at),
    )
}
