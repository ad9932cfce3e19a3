//! Dashboard aggregation
//!
//! Pure recompute functions over day partitions plus the background task
//! that re-runs them on every ledger change.

pub mod stats;

use crate::aggregate::stats::{leaderboard, recent_activity, status_totals};
use chrono::NaiveDate;
use presensi_common::db::Ledger;
use presensi_common::events::{HubEvent, LedgerEvent};
use presensi_common::record::{AttendanceRecord, OfficerStat, StatusTotals};
use presensi_common::time::{today, trailing_days};
use presensi_common::Result;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Leaderboard / recent-activity depth
pub const TOP_N: usize = 5;

/// Trailing window for the weekly leaderboard, inclusive of today
pub const WEEKLY_WINDOW_DAYS: u32 = 7;

/// Everything a dashboard needs for one day
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub day: NaiveDate,
    pub totals: StatusTotals,
    pub daily_leaderboard: Vec<OfficerStat>,
    pub weekly_leaderboard: Vec<OfficerStat>,
    pub recent: Vec<AttendanceRecord>,
}

/// Compute the full dashboard snapshot for `day`
///
/// O(partition size) per partition; partitions are bounded by roster
/// size, so recomputing from scratch on every change is fine.
pub async fn compute_snapshot(ledger: &Ledger, day: NaiveDate) -> Result<DashboardSnapshot> {
    let partition = ledger.partition(day).await?;
    compute_snapshot_from(ledger, day, partition).await
}

async fn compute_snapshot_from(
    ledger: &Ledger,
    day: NaiveDate,
    partition: Vec<AttendanceRecord>,
) -> Result<DashboardSnapshot> {
    // Day partitions are disjoint by construction, so the weekly union
    // never double-counts a record.
    let mut window: Vec<AttendanceRecord> = Vec::new();
    for d in trailing_days(day, WEEKLY_WINDOW_DAYS) {
        if d == day {
            window.extend(partition.iter().cloned());
        } else {
            window.extend(ledger.partition(d).await?);
        }
    }

    Ok(DashboardSnapshot {
        day,
        totals: status_totals(&partition),
        daily_leaderboard: leaderboard(&partition, TOP_N),
        weekly_leaderboard: leaderboard(&window, TOP_N),
        recent: recent_activity(&partition, TOP_N),
    })
}

/// Background task recomputing dashboard state on every ledger change
pub struct Aggregator {
    ledger: Ledger,
    event_tx: broadcast::Sender<HubEvent>,
}

impl Aggregator {
    pub fn new(ledger: Ledger, event_tx: broadcast::Sender<HubEvent>) -> Self {
        Self { ledger, event_tx }
    }

    /// Spawn the subscription loop
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Aggregator subscribed to ledger changes");
            self.run().await;
        })
    }

    async fn run(self) {
        let mut rx = self.ledger.subscribe();
        loop {
            match rx.recv().await {
                Ok(LedgerEvent::PartitionSnapshot { day, records, .. }) => {
                    // Only "today" drives the live dashboard; historical
                    // partitions change only through admin cleanup and are
                    // refetched on demand.
                    if day != today() {
                        debug!("Ignoring change to historical partition {}", day);
                        continue;
                    }
                    match compute_snapshot_from(&self.ledger, day, records).await {
                        Ok(snapshot) => {
                            let _ = self.event_tx.send(HubEvent::DashboardUpdated {
                                day: snapshot.day,
                                totals: snapshot.totals,
                                daily_leaderboard: snapshot.daily_leaderboard,
                                weekly_leaderboard: snapshot.weekly_leaderboard,
                                recent: snapshot.recent,
                                timestamp: chrono::Utc::now(),
                            });
                        }
                        Err(e) => warn!("Dashboard recompute failed: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Snapshots are self-healing; the next event carries
                    // the complete partition.
                    warn!("Aggregator lagged, missed {} ledger events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Ledger event channel closed, aggregator stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presensi_common::db::init::create_tables;
    use presensi_common::{AttendanceStatus, Gender, RecordKey, RecordOrigin};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_ledger() -> Ledger {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        Ledger::new(pool)
    }

    fn record(name: &str, day: NaiveDate, by: &str, at_ms: i64) -> AttendanceRecord {
        AttendanceRecord {
            key: RecordKey::derive(name, "X.1"),
            name: name.to_string(),
            class: "X.1".to_string(),
            gender: Gender::Female,
            day,
            recorded_at_ms: at_ms,
            recorded_time: "07:05".to_string(),
            status: AttendanceStatus::Present,
            origin: RecordOrigin::Scan,
            recorded_by: by.to_string(),
            recorded_by_class: "XII.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_weekly_equals_sum_of_daily_counts() {
        let ledger = setup_ledger().await;
        let day_n = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        // Two records by u1 inside the window, one by u2, and one by u1
        // on day N-7 that must not count.
        for (name, offset, by) in [
            ("Ahmad", 0i64, "u1"),
            ("Budi", 3, "u1"),
            ("Citra", 6, "u2"),
            ("Dewi", 7, "u1"),
        ] {
            let day = day_n - chrono::Days::new(offset as u64);
            ledger.upsert(&record(name, day, by, 1000 + offset)).await.unwrap();
        }

        let snapshot = compute_snapshot(&ledger, day_n).await.unwrap();
        let u1 = snapshot
            .weekly_leaderboard
            .iter()
            .find(|s| s.operator == "u1")
            .unwrap();
        assert_eq!(u1.count, 2, "day N-7 falls outside the trailing window");
        let u2 = snapshot
            .weekly_leaderboard
            .iter()
            .find(|s| s.operator == "u2")
            .unwrap();
        assert_eq!(u2.count, 1);

        // Advancing the date drops the oldest day from the window
        let snapshot_next = compute_snapshot(&ledger, day_n + chrono::Days::new(1))
            .await
            .unwrap();
        let u2_next = snapshot_next
            .weekly_leaderboard
            .iter()
            .find(|s| s.operator == "u2");
        assert!(u2_next.is_some(), "N-6 still inside");
        let snapshot_later = compute_snapshot(&ledger, day_n + chrono::Days::new(7))
            .await
            .unwrap();
        assert!(
            snapshot_later
                .weekly_leaderboard
                .iter()
                .all(|s| s.operator != "u2"),
            "record dropped once the window advanced past its day"
        );
    }

    #[tokio::test]
    async fn test_daily_snapshot_counts_only_that_day() {
        let ledger = setup_ledger().await;
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        ledger.upsert(&record("Ahmad", day, "u1", 1000)).await.unwrap();
        ledger
            .upsert(&record("Budi", day - chrono::Days::new(1), "u1", 900))
            .await
            .unwrap();

        let snapshot = compute_snapshot(&ledger, day).await.unwrap();
        assert_eq!(snapshot.totals.total, 1);
        assert_eq!(snapshot.daily_leaderboard[0].count, 1);
        assert_eq!(snapshot.weekly_leaderboard[0].count, 2);
    }
}
