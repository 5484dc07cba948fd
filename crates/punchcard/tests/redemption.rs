//! End-to-end redemption flows over real ledger backends.

use std::sync::Arc;

use punchcard::{
    BusinessId, CustomerId, Ledger, MemoryLedger, RedemptionSource, RedemptionStatus,
    ServiceConfig, ServiceError, SqliteLedger, StampService, TokenError,
};
use punchcard_testkit::{TestFixture, FIXTURE_NOW};

const NOW: i64 = 1_700_000_000;

fn service<L: Ledger>(ledger: L) -> StampService<L> {
    StampService::new(&ServiceConfig::new([3u8; 32]), ledger)
}

#[tokio::test]
async fn full_lifecycle_over_sqlite() {
    let service = service(SqliteLedger::open_memory().unwrap());
    let business = BusinessId::from("biz_1");
    let customer = CustomerId::from("cust_9");

    let issued = service.issue_stamp_qr_at(&business, 3, NOW).unwrap();
    assert_eq!(issued.expires_at - issued.issued_at, 30);
    assert_eq!(
        service
            .check_status_at(&business, &issued.redemption_id, NOW + 1)
            .await
            .unwrap(),
        RedemptionStatus::Pending
    );

    let record = service.redeem_at(&issued.token, &customer, NOW + 5).await.unwrap();
    assert_eq!(record.redemption_id, issued.redemption_id);
    assert_eq!(record.business_id, business);
    assert_eq!(record.customer_id, customer);
    assert_eq!(record.stamps_awarded, 3);
    assert_eq!(record.source, RedemptionSource::QrScan);

    let balance = service.ledger().balance(&customer).await.unwrap().unwrap();
    assert_eq!(balance.total_stamps, 3);
    assert_eq!(balance.total_visits, 1);
    assert_eq!(balance.last_visit, NOW + 5);

    // Replay: exactly-once holds, balance does not move.
    let replay = service.redeem_at(&issued.token, &customer, NOW + 6).await;
    assert!(matches!(replay, Err(ServiceError::AlreadyRedeemed(_))));
    let balance = service.ledger().balance(&customer).await.unwrap().unwrap();
    assert_eq!(balance.total_stamps, 3);

    assert_eq!(
        service
            .check_status_at(&business, &issued.redemption_id, NOW + 7)
            .await
            .unwrap(),
        RedemptionStatus::Redeemed
    );
}

#[tokio::test]
async fn expiry_wins_over_replay_reporting() {
    let service = service(MemoryLedger::new());
    let business = BusinessId::from("biz_1");
    let customer = CustomerId::from("cust_9");

    let issued = service.issue_stamp_qr_at(&business, 2, NOW).unwrap();
    service.redeem_at(&issued.token, &customer, NOW + 1).await.unwrap();

    // Past the window the token reads as expired regardless of having
    // been consumed already.
    let result = service.redeem_at(&issued.token, &customer, NOW + 31).await;
    assert!(matches!(
        result,
        Err(ServiceError::Token(TokenError::Expired { .. }))
    ));
}

#[tokio::test]
async fn unconsumed_token_expires() {
    let service = service(MemoryLedger::new());
    let business = BusinessId::from("biz_1");

    let issued = service.issue_stamp_qr_at(&business, 2, NOW).unwrap();
    let result = service
        .redeem_at(&issued.token, &CustomerId::from("cust_9"), NOW + 31)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Token(TokenError::Expired { expires_at, now }))
            if expires_at == NOW + 30 && now == NOW + 31
    ));

    assert_eq!(
        service
            .check_status_at(&business, &issued.redemption_id, NOW + 31)
            .await
            .unwrap(),
        RedemptionStatus::Expired
    );
}

#[tokio::test]
async fn tampered_token_never_redeems() {
    let service = service(MemoryLedger::new());
    let issued = service
        .issue_stamp_qr_at(&BusinessId::from("biz_1"), 9, NOW)
        .unwrap();

    let mut raw = hex::decode(&issued.token).unwrap();
    let mid = raw.len() / 2;
    raw[mid] ^= 0x10;
    let tampered = hex::encode(raw);

    let result = service
        .redeem_at(&tampered, &CustomerId::from("cust_9"), NOW + 1)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Token(TokenError::InvalidSignature))
            | Err(ServiceError::Token(TokenError::Malformed(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_redemption_exactly_once_memory() {
    concurrent_redemption_exactly_once(MemoryLedger::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_redemption_exactly_once_sqlite() {
    concurrent_redemption_exactly_once(SqliteLedger::open_memory().unwrap()).await;
}

async fn concurrent_redemption_exactly_once<L: Ledger + 'static>(ledger: L) {
    const ATTEMPTS: usize = 16;

    let service = Arc::new(service(ledger));
    let customer = CustomerId::from("cust_9");
    let issued = service
        .issue_stamp_qr_at(&BusinessId::from("biz_1"), 4, NOW)
        .unwrap();

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let service = service.clone();
        let token = issued.token.clone();
        let customer = customer.clone();
        handles.push(tokio::spawn(async move {
            service.redeem_at(&token, &customer, NOW + 5).await
        }));
    }

    let mut successes = 0;
    let mut replays = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::AlreadyRedeemed(_)) => replays += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(replays, ATTEMPTS - 1);

    let balance = service.ledger().balance(&customer).await.unwrap().unwrap();
    assert_eq!(balance.total_stamps, 4);
    assert_eq!(balance.total_visits, 1);
}

#[tokio::test]
async fn fixture_tokens_redeem_through_service() {
    let seed = [0xabu8; 32];
    let fixture = TestFixture::with_seed(seed);
    let (token, claims) = fixture.make_token("biz_7", 6);

    // A service keyed with the same seed accepts the fixture's tokens.
    let service = StampService::new(&ServiceConfig::new(seed), fixture.ledger);
    let record = service
        .redeem_at(&token, &CustomerId::from("cust_1"), FIXTURE_NOW + 3)
        .await
        .unwrap();
    assert_eq!(record.redemption_id, claims.redemption_id);
    assert_eq!(record.stamps_awarded, 6);
}

#[tokio::test]
async fn balance_equals_sum_of_records() {
    let service = service(SqliteLedger::open_memory().unwrap());
    let business = BusinessId::from("biz_1");
    let customer = CustomerId::from("cust_9");

    for (stamps, offset) in [(3u8, 0i64), (1, 10), (7, 20)] {
        let issued = service
            .issue_stamp_qr_at(&business, stamps, NOW + offset)
            .unwrap();
        service
            .redeem_at(&issued.token, &customer, NOW + offset + 2)
            .await
            .unwrap();
    }
    service
        .grant_stamps_at(&business, &customer, 2, RedemptionSource::Promotion, None, NOW + 40)
        .await
        .unwrap();

    let records = service
        .ledger()
        .redemptions_for_customer(&customer)
        .await
        .unwrap();
    let balance = service.ledger().balance(&customer).await.unwrap().unwrap();

    let sum: u64 = records.iter().map(|r| r.stamps_awarded as u64).sum();
    assert_eq!(balance.total_stamps, sum);
    assert_eq!(balance.total_visits, records.len() as u64);
    assert_eq!(balance.total_stamps, 13);
}
