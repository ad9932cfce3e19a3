//! Roster-driven attendance mutation
//!
//! Lets an administrator set a student's status directly from the master
//! roster, bypassing scanning, through the same ledger upsert path. The
//! record key is derived exactly as a scan would derive it, so a later
//! scan of the same student resolves to this record and triggers the
//! overwrite dialog instead of creating a second row.

use presensi_common::db::Ledger;
use presensi_common::time::CaptureInstant;
use presensi_common::{
    AttendanceRecord, AttendanceStatus, Error, MasterStudent, RecordOrigin, Result,
};
use tracing::info;

/// Officer-class bucket recorded for administrator writes
const ADMIN_CLASS: &str = "admin";

/// Upsert an attendance record for `student` with an admin-chosen status
pub async fn set_attendance(
    ledger: &Ledger,
    student: &MasterStudent,
    status: AttendanceStatus,
    admin: &str,
) -> Result<AttendanceRecord> {
    let instant = CaptureInstant::now();
    let record = AttendanceRecord {
        key: student.record_key(),
        name: student.name.clone(),
        class: student.class.clone(),
        gender: student.gender,
        day: instant.day,
        recorded_at_ms: instant.at_ms,
        recorded_time: instant.formatted_time(),
        status,
        origin: RecordOrigin::Manual,
        recorded_by: admin.to_string(),
        recorded_by_class: ADMIN_CLASS.to_string(),
    };

    ledger
        .upsert(&record)
        .await
        .map_err(|e| Error::Persistence(e.to_string()))?;

    info!(
        "Roster mutation: {} set {} to {}",
        admin, record.name, record.status
    );

    Ok(record)
}
