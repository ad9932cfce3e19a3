//! Duplicate resolver
//!
//! Given a decoded identity and a day, decide whether a scan would create
//! a new record or overwrite an existing one. The decision collapses
//! duplicate detection into ordinary last-write-wins on a stable key: an
//! overwrite reuses the existing record's key, so the following upsert
//! replaces rather than duplicates the row.

use chrono::NaiveDate;
use presensi_common::db::Ledger;
use presensi_common::{AttendanceRecord, Error, RecordKey, Result, StudentIdentity};

/// Outcome of the duplicate check
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No record yet at `(day, key)`: proceed to new-record confirmation
    New { key: RecordKey },
    /// A record exists: the operator must explicitly cancel or overwrite
    Existing {
        key: RecordKey,
        record: AttendanceRecord,
    },
}

/// Derive the identity's key and look it up in the day partition
///
/// Fails closed: a lookup error is surfaced as [`Error::Lookup`] and must
/// block confirmation. It is never treated as "no duplicate"; that would
/// risk writing a diverging record once the store recovers.
pub async fn resolve(
    ledger: &Ledger,
    identity: &StudentIdentity,
    day: NaiveDate,
) -> Result<Resolution> {
    let key = RecordKey::derive(&identity.name, &identity.class);

    let existing = ledger
        .get(day, &key)
        .await
        .map_err(|e| Error::Lookup(e.to_string()))?;

    match existing {
        Some(record) => Ok(Resolution::Existing { key, record }),
        None => Ok(Resolution::New { key }),
    }
}
