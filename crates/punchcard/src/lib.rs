//! # Punchcard
//!
//! The loyalty stamp-QR service: businesses mint short-lived signed QR
//! tokens, customers redeem them for stamps, and the ledger guarantees
//! each token lands at most once.
//!
//! ## Overview
//!
//! - [`StampService::issue_stamp_qr`] mints a 30-second single-use token
//! - [`StampService::redeem`] consumes it, atomically writing the
//!   redemption record and the customer's balance update
//! - [`StampService::check_status`] lets the issuer poll pending /
//!   redeemed / expired without consuming anything
//! - [`StampService::grant_stamps`] awards stamps directly (manual or
//!   promotional), bypassing the token path
//!
//! The HTTP layer, QR rendering, and auth live elsewhere; this crate
//! takes authenticated identifiers and returns typed results.

pub mod config;
pub mod error;
pub mod pending;
pub mod service;

pub use config::{ServiceConfig, SIGNING_KEY_ENV};
pub use error::{Result, ServiceError};
pub use pending::{PendingEntry, PendingIssuances};
pub use service::{IssuedQr, RedemptionStatus, StampService};

// Re-export the pieces callers almost always need alongside the service.
pub use punchcard_core::{
    BusinessId, CustomerId, QrClaims, RedemptionId, RedemptionRecord, RedemptionSource,
    StampBalance, TokenCodec, TokenError, QR_TTL_SECS,
};
pub use punchcard_store::{Ledger, MemoryLedger, RecordOutcome, SqliteLedger, StoreError};
