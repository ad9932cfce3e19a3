//! Event types for the Presensi change-notification system
//!
//! The ledger pushes the complete current contents of a day partition on
//! every change, never a diff, so a subscriber that missed an event is
//! whole again after the next one.

use crate::record::{AttendanceRecord, OfficerStat, StatusTotals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ledger change notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Full current record set for one day, emitted after every
    /// successful upsert (and after bulk deletes) touching that day
    PartitionSnapshot {
        day: NaiveDate,
        records: Vec<AttendanceRecord>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LedgerEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            LedgerEvent::PartitionSnapshot { .. } => "PartitionSnapshot",
        }
    }
}

/// Events pushed to dashboards and operator devices over SSE
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    /// Recomputed dashboard aggregates for "today"
    DashboardUpdated {
        day: NaiveDate,
        totals: StatusTotals,
        daily_leaderboard: Vec<OfficerStat>,
        weekly_leaderboard: Vec<OfficerStat>,
        recent: Vec<AttendanceRecord>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An operator's scan session wants the device camera paused or
    /// resumed (decision pending / decision made)
    CaptureCommand {
        operator: String,
        pause: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A record was written (scan confirmation or roster mutation)
    RecordUpserted {
        record: AttendanceRecord,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HubEvent {
    pub fn event_type(&self) -> &str {
        match self {
            HubEvent::DashboardUpdated { .. } => "DashboardUpdated",
            HubEvent::CaptureCommand { .. } => "CaptureCommand",
            HubEvent::RecordUpserted { .. } => "RecordUpserted",
        }
    }
}
