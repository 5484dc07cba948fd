//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system: each migration transforms the
//! schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_secs()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(version = CURRENT_VERSION, "ledger schema migrated");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Append-only redemption ledger. The primary key on
        -- redemption_id is the exactly-once guarantee.
        CREATE TABLE redemptions (
            redemption_id TEXT PRIMARY KEY,
            business_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            stamps_awarded INTEGER NOT NULL,
            source TEXT NOT NULL,              -- qr_scan | manual | promotion
            notes TEXT,
            created_at INTEGER NOT NULL        -- unix seconds
        );

        -- Derived per-customer aggregate, written only inside the same
        -- transaction as the redemption insert.
        CREATE TABLE balances (
            customer_id TEXT PRIMARY KEY,
            total_stamps INTEGER NOT NULL DEFAULT 0,
            total_visits INTEGER NOT NULL DEFAULT 0,
            last_visit INTEGER NOT NULL DEFAULT 0
        );

        -- Indexes for the read paths
        CREATE INDEX idx_redemptions_business ON redemptions(business_id, created_at);
        CREATE INDEX idx_redemptions_customer ON redemptions(customer_id, created_at);
        "#,
    )?;

    Ok(())
}

/// Get current time in seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
