//! Pure aggregate computations over attendance partitions

use presensi_common::record::{AttendanceRecord, AttendanceStatus, OfficerStat, StatusTotals};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bucket for records whose recording operator has no class set
const UNASSIGNED_CLASS: &str = "unassigned";

/// Count records per status for one day partition
pub fn status_totals(records: &[AttendanceRecord]) -> StatusTotals {
    let mut totals = StatusTotals::default();
    for record in records {
        match record.status {
            AttendanceStatus::Present => totals.present += 1,
            AttendanceStatus::Excused => totals.excused += 1,
            AttendanceStatus::Absent => totals.absent += 1,
        }
        totals.total += 1;
    }
    totals
}

/// Per-operator record counts: descending by count, ties broken by
/// ascending operator name, truncated to `top_n`
pub fn leaderboard(records: &[AttendanceRecord], top_n: usize) -> Vec<OfficerStat> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for record in records {
        *counts.entry(record.recorded_by.as_str()).or_default() += 1;
    }

    let mut stats: Vec<OfficerStat> = counts
        .into_iter()
        .map(|(operator, count)| OfficerStat {
            operator: operator.to_string(),
            count,
        })
        .collect();
    // BTreeMap iteration already yields names ascending, so a stable
    // sort on count keeps that order within ties.
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(top_n);
    stats
}

/// The `n` most recent records by capture time, newest first
pub fn recent_activity(records: &[AttendanceRecord], n: usize) -> Vec<AttendanceRecord> {
    let mut sorted: Vec<AttendanceRecord> = records.to_vec();
    sorted.sort_by(|a, b| b.recorded_at_ms.cmp(&a.recorded_at_ms));
    sorted.truncate(n);
    sorted
}

/// All-time officer activity grouped by officer class, for the admin view
#[derive(Debug, Clone, Serialize)]
pub struct GlobalOfficerStats {
    pub total_records: u64,
    /// Per officer class, officers ranked by record count descending
    pub officers: BTreeMap<String, Vec<OfficerStat>>,
}

/// Fold any number of day partitions into global per-class officer stats
pub fn global_officer_stats<'a, I>(partitions: I) -> GlobalOfficerStats
where
    I: IntoIterator<Item = &'a [AttendanceRecord]>,
{
    let mut total_records: u64 = 0;
    let mut per_class: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

    for partition in partitions {
        total_records += partition.len() as u64;
        for record in partition {
            let class = if record.recorded_by_class.is_empty() {
                UNASSIGNED_CLASS.to_string()
            } else {
                record.recorded_by_class.clone()
            };
            *per_class
                .entry(class)
                .or_default()
                .entry(record.recorded_by.clone())
                .or_default() += 1;
        }
    }

    let officers = per_class
        .into_iter()
        .map(|(class, counts)| {
            let mut stats: Vec<OfficerStat> = counts
                .into_iter()
                .map(|(operator, count)| OfficerStat { operator, count })
                .collect();
            stats.sort_by(|a, b| b.count.cmp(&a.count));
            (class, stats)
        })
        .collect();

    GlobalOfficerStats {
        total_records,
        officers,
    }
}
