//! Attendance ledger
//!
//! Durable per-day keyed store of attendance records. All mutation goes
//! through [`Ledger::upsert`]: a full-record replacement on the
//! `(day, record_key)` primary key, atomic at the storage layer, so
//! concurrent writers can never produce two rows for the same student on
//! the same day. Subscribers receive the complete current partition after
//! every successful write.

use crate::error::{Error, Result};
use crate::events::LedgerEvent;
use crate::identity::Gender;
use crate::key::RecordKey;
use crate::record::{AttendanceRecord, AttendanceStatus, RecordOrigin};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Buffered change notifications per subscriber
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Row tuple as stored in the `attendance` table
type AttendanceRow = (
    String,    // record_key
    String,    // name
    String,    // class
    String,    // gender
    NaiveDate, // day
    i64,       // recorded_at_ms
    String,    // recorded_time
    String,    // status
    String,    // origin
    String,    // recorded_by
    String,    // recorded_by_class
);

const SELECT_COLUMNS: &str = "record_key, name, class, gender, day, recorded_at_ms, \
     recorded_time, status, origin, recorded_by, recorded_by_class";

/// The shared attendance store
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
    event_tx: broadcast::Sender<LedgerEvent>,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { pool, event_tx }
    }

    /// Write `record` as the sole entry at its `(day, key)` slot
    ///
    /// Idempotent; replaces every field of any prior entry (no merge).
    /// On success the full refreshed partition is broadcast to
    /// subscribers. On failure nothing is broadcast and the prior state
    /// remains observable.
    pub async fn upsert(&self, record: &AttendanceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance
                (day, record_key, name, class, gender, recorded_at_ms,
                 recorded_time, status, origin, recorded_by, recorded_by_class)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(day, record_key) DO UPDATE SET
                name = excluded.name,
                class = excluded.class,
                gender = excluded.gender,
                recorded_at_ms = excluded.recorded_at_ms,
                recorded_time = excluded.recorded_time,
                status = excluded.status,
                origin = excluded.origin,
                recorded_by = excluded.recorded_by,
                recorded_by_class = excluded.recorded_by_class
            "#,
        )
        .bind(record.day)
        .bind(record.key.as_str())
        .bind(&record.name)
        .bind(&record.class)
        .bind(record.gender.as_letter())
        .bind(record.recorded_at_ms)
        .bind(&record.recorded_time)
        .bind(record.status.as_str())
        .bind(record.origin.as_str())
        .bind(&record.recorded_by)
        .bind(&record.recorded_by_class)
        .execute(&self.pool)
        .await?;

        debug!(
            "Upserted attendance record {} for {}",
            record.key, record.day
        );

        self.broadcast_partition(record.day).await?;
        Ok(())
    }

    /// Point lookup used by the duplicate resolver
    pub async fn get(&self, day: NaiveDate, key: &RecordKey) -> Result<Option<AttendanceRecord>> {
        let row: Option<AttendanceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM attendance WHERE day = ? AND record_key = ?",
            SELECT_COLUMNS
        ))
        .bind(day)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    /// Full day partition, newest first
    pub async fn partition(&self, day: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let rows: Vec<AttendanceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM attendance WHERE day = ? ORDER BY recorded_at_ms DESC",
            SELECT_COLUMNS
        ))
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Every day that currently has at least one record, oldest first
    pub async fn days(&self) -> Result<Vec<NaiveDate>> {
        let days: Vec<(NaiveDate,)> =
            sqlx::query_as("SELECT DISTINCT day FROM attendance ORDER BY day ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(days.into_iter().map(|(d,)| d).collect())
    }

    /// Remove every record written by `operator`, across all days
    ///
    /// Admin cleanup for a decommissioned officer account. Broadcasts a
    /// fresh snapshot for each affected day.
    pub async fn delete_operator_records(&self, operator: &str) -> Result<u64> {
        let affected_days: Vec<(NaiveDate,)> =
            sqlx::query_as("SELECT DISTINCT day FROM attendance WHERE recorded_by = ?")
                .bind(operator)
                .fetch_all(&self.pool)
                .await?;

        let result = sqlx::query("DELETE FROM attendance WHERE recorded_by = ?")
            .bind(operator)
            .execute(&self.pool)
            .await?;

        info!(
            "Deleted {} records recorded by {}",
            result.rows_affected(),
            operator
        );

        for (day,) in affected_days {
            self.broadcast_partition(day).await?;
        }

        Ok(result.rows_affected())
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.event_tx.subscribe()
    }

    /// Read the current partition and push it to all subscribers
    async fn broadcast_partition(&self, day: NaiveDate) -> Result<()> {
        let records = self.partition(day).await?;
        // No receivers is fine
        let _ = self.event_tx.send(LedgerEvent::PartitionSnapshot {
            day,
            records,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }
}

fn row_to_record(row: AttendanceRow) -> Result<AttendanceRecord> {
    let (key, name, class, gender, day, recorded_at_ms, recorded_time, status, origin, recorded_by, recorded_by_class) =
        row;

    let gender = Gender::from_letter(&gender)
        .ok_or_else(|| Error::Internal(format!("corrupt gender in ledger: {}", gender)))?;
    let status = AttendanceStatus::parse(&status)
        .ok_or_else(|| Error::Internal(format!("corrupt status in ledger: {}", status)))?;
    let origin = RecordOrigin::parse(&origin)
        .ok_or_else(|| Error::Internal(format!("corrupt origin in ledger: {}", origin)))?;

    Ok(AttendanceRecord {
        key: RecordKey::from_stored(key),
        name,
        class,
        gender,
        day,
        recorded_at_ms,
        recorded_time,
        status,
        origin,
        recorded_by,
        recorded_by_class,
    })
}
