//! Attendance record and roster data model

use crate::identity::{Gender, StudentIdentity};
use crate::key::RecordKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical attendance status
///
/// The status taxonomy drifted across deployments (HADIR / SHOLAT /
/// SCAN_HADIR for present, IZIN / SAKIT / HALANGAN for excused, ALPHA /
/// TIDAK_SHOLAT for absent). The ledger stores exactly this closed set;
/// how the record was produced lives in [`RecordOrigin`], not in the
/// status spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Excused,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// Parse the stored form; `None` for anything outside the closed set
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "excused" => Some(AttendanceStatus::Excused),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a record entered the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    /// Scanned from the student's QR card by an officer
    Scan,
    /// Entered by an administrator from the master roster
    Manual,
}

impl RecordOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOrigin::Scan => "scan",
            RecordOrigin::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scan" => Some(RecordOrigin::Scan),
            "manual" => Some(RecordOrigin::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attendance record, the sole entry at its `(day, key)` slot
///
/// Created on the first successful upsert for its key and day, replaced
/// wholesale by any later upsert for the same slot. Never merged, never
/// explicitly deleted; a new calendar day simply opens a new partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub key: RecordKey,
    pub name: String,
    pub class: String,
    pub gender: Gender,
    /// Local calendar day the record belongs to (partition key)
    pub day: NaiveDate,
    /// Wall-clock capture instant, epoch milliseconds
    pub recorded_at_ms: i64,
    /// Pre-formatted local "HH:MM" for display and export
    pub recorded_time: String,
    pub status: AttendanceStatus,
    pub origin: RecordOrigin,
    /// Operator (officer or admin) account that recorded the event
    pub recorded_by: String,
    pub recorded_by_class: String,
}

impl AttendanceRecord {
    /// The identity this record was captured from
    pub fn identity(&self) -> StudentIdentity {
        StudentIdentity {
            name: self.name.clone(),
            class: self.class.clone(),
            gender: self.gender,
        }
    }
}

/// Roster entry: a student identity with a stable roster id
///
/// The roster is the source of identities independent of scanning. Its
/// record key is still derived from `(name, class)` so a roster-driven
/// write and a scan of the same student target the same ledger slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterStudent {
    pub id: String,
    pub name: String,
    pub class: String,
    pub gender: Gender,
}

impl MasterStudent {
    pub fn identity(&self) -> StudentIdentity {
        StudentIdentity {
            name: self.name.clone(),
            class: self.class.clone(),
            gender: self.gender,
        }
    }

    /// Key this student's attendance is stored under, identical to what
    /// a scan of the same card would derive
    pub fn record_key(&self) -> RecordKey {
        RecordKey::derive(&self.name, &self.class)
    }
}

/// Per-operator record count, derived from a day partition or a window
/// of partitions; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficerStat {
    pub operator: String,
    pub count: u32,
}

/// Per-status record counts for one day partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub present: u32,
    pub excused: u32,
    pub absent: u32,
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Excused,
            AttendanceStatus::Absent,
        ] {
            assert_eq!(AttendanceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AttendanceStatus::parse("HADIR"), None);
    }

    #[test]
    fn test_origin_round_trips_through_storage_form() {
        assert_eq!(RecordOrigin::parse("scan"), Some(RecordOrigin::Scan));
        assert_eq!(RecordOrigin::parse("manual"), Some(RecordOrigin::Manual));
        assert_eq!(RecordOrigin::parse("SCAN_HADIR"), None);
    }

    #[test]
    fn test_roster_key_matches_scan_derivation() {
        let student = MasterStudent {
            id: "stu-001".to_string(),
            name: "Ahmad".to_string(),
            class: "X.1".to_string(),
            gender: Gender::Male,
        };
        assert_eq!(student.record_key(), RecordKey::derive("Ahmad", "X.1"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AttendanceStatus::Present).unwrap();
        assert_eq!(json, "\"present\"");
    }
}
