//! # Punchcard Testkit
//!
//! Testing utilities for the punchcard workspace.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic codec + in-memory ledger setups
//! - **Generators**: proptest strategies for identifiers and claims
//!
//! ## Test Fixtures
//!
//! Quickly set up a scenario:
//!
//! ```rust
//! use punchcard_testkit::fixtures::{TestFixture, FIXTURE_NOW};
//!
//! let fixture = TestFixture::new();
//! let (token, claims) = fixture.make_token("biz_1", 3);
//! assert!(fixture.codec.decode_at(&token, FIXTURE_NOW).is_ok());
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use punchcard_testkit::generators::qr_claims;
//!
//! proptest! {
//!     #[test]
//!     fn window_is_thirty_seconds(claims in qr_claims()) {
//!         prop_assert_eq!(claims.expires_at - claims.issued_at, 30);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestFixture, FIXTURE_NOW};
