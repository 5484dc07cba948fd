//! SQLite implementation of the Ledger trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use punchcard_core::{
    BusinessId, CustomerId, RedemptionId, RedemptionRecord, RedemptionSource, StampBalance,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Ledger, RecordOutcome};

/// SQLite-based ledger implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime. The redemption insert and the
/// balance update share one transaction; the primary key on
/// `redemption_id` is the serialization point for racing redeems.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Lock the connection, converting a poisoned mutex into a store error.
fn lock_conn(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::InvalidData(format!("connection mutex poisoned: {}", e)))
}

/// Convert a spawn_blocking join failure into a store error.
fn join_err(e: tokio::task::JoinError) -> StoreError {
    StoreError::InvalidData(format!("spawn_blocking failed: {}", e))
}

/// True when the error is a unique/primary-key constraint violation.
///
/// This is the only place the vendor error code is inspected; callers
/// see it as `RecordOutcome::DuplicateKey`.
fn is_duplicate_key(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// Helper to convert a row to RedemptionRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RedemptionRecord> {
    let source_text: String = row.get("source")?;
    let source = RedemptionSource::parse(&source_text).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(4, "source".into(), rusqlite::types::Type::Text)
    })?;

    Ok(RedemptionRecord {
        redemption_id: RedemptionId::new(row.get::<_, String>("redemption_id")?),
        business_id: BusinessId::new(row.get::<_, String>("business_id")?),
        customer_id: CustomerId::new(row.get::<_, String>("customer_id")?),
        stamps_awarded: row.get("stamps_awarded")?,
        source,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

const RECORD_COLUMNS: &str =
    "redemption_id, business_id, customer_id, stamps_awarded, source, notes, created_at";

#[async_trait]
impl Ledger for SqliteLedger {
    async fn record_redemption(&self, record: &RedemptionRecord) -> Result<RecordOutcome> {
        let record = record.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock_conn(&conn)?;
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO redemptions (
                    redemption_id, business_id, customer_id, stamps_awarded,
                    source, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.redemption_id.as_str(),
                    record.business_id.as_str(),
                    record.customer_id.as_str(),
                    record.stamps_awarded,
                    record.source.as_str(),
                    record.notes.as_deref(),
                    record.created_at,
                ],
            );

            match inserted {
                // Dropping the uncommitted transaction rolls it back;
                // no partial state survives a replay.
                Err(e) if is_duplicate_key(&e) => return Ok(RecordOutcome::DuplicateKey),
                Err(e) => return Err(e.into()),
                Ok(_) => {}
            }

            tx.execute(
                "INSERT INTO balances (customer_id, total_stamps, total_visits, last_visit)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(customer_id) DO UPDATE SET
                    total_stamps = total_stamps + excluded.total_stamps,
                    total_visits = total_visits + 1,
                    last_visit = excluded.last_visit",
                params![
                    record.customer_id.as_str(),
                    record.stamps_awarded as i64,
                    record.created_at,
                ],
            )?;

            let balance = tx.query_row(
                "SELECT total_stamps, total_visits, last_visit
                 FROM balances WHERE customer_id = ?1",
                params![record.customer_id.as_str()],
                |row| {
                    Ok(StampBalance {
                        customer_id: record.customer_id.clone(),
                        total_stamps: row.get::<_, i64>(0)? as u64,
                        total_visits: row.get::<_, i64>(1)? as u64,
                        last_visit: row.get(2)?,
                    })
                },
            )?;

            tx.commit()?;
            Ok(RecordOutcome::Recorded { balance })
        })
        .await
        .map_err(join_err)?
    }

    async fn redemption(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>> {
        let id = id.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.query_row(
                &format!(
                    "SELECT {} FROM redemptions WHERE redemption_id = ?1",
                    RECORD_COLUMNS
                ),
                params![id.as_str()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
        .map_err(join_err)?
    }

    async fn balance(&self, customer: &CustomerId) -> Result<Option<StampBalance>> {
        let customer = customer.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.query_row(
                "SELECT total_stamps, total_visits, last_visit
                 FROM balances WHERE customer_id = ?1",
                params![customer.as_str()],
                |row| {
                    Ok(StampBalance {
                        customer_id: customer.clone(),
                        total_stamps: row.get::<_, i64>(0)? as u64,
                        total_visits: row.get::<_, i64>(1)? as u64,
                        last_visit: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
        .map_err(join_err)?
    }

    async fn redemptions_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<RedemptionRecord>> {
        let customer = customer.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM redemptions
                 WHERE customer_id = ?1
                 ORDER BY created_at DESC, redemption_id",
                RECORD_COLUMNS
            ))?;

            let records = stmt
                .query_map(params![customer.as_str()], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records)
        })
        .await
        .map_err(join_err)?
    }

    async fn redemptions_for_business(
        &self,
        business: &BusinessId,
        limit: u32,
    ) -> Result<Vec<RedemptionRecord>> {
        let business = business.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM redemptions
                 WHERE business_id = ?1
                 ORDER BY created_at DESC, redemption_id
                 LIMIT ?2",
                RECORD_COLUMNS
            ))?;

            let records = stmt
                .query_map(params![business.as_str(), limit], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records)
        })
        .await
        .map_err(join_err)?
    }
}
