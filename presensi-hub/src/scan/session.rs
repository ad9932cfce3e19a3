//! Scan session state machine
//!
//! One session per operator device, looping for the lifetime of a scanning
//! shift: idle → decode → duplicate check → operator confirmation →
//! persist → idle. The session owns the camera pause/resume contract so no
//! further decode events arrive while a decision is pending, and it holds
//! the identity captured at decode time so a slow confirmation dialog can
//! never target a different student.

use crate::scan::resolver::{self, Resolution};
use presensi_common::db::Ledger;
use presensi_common::time::{today, CaptureInstant};
use presensi_common::{
    decode_payload, AttendanceRecord, AttendanceStatus, Error, RecordKey, RecordOrigin, Result,
    StudentIdentity,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Camera capture contract
///
/// The device camera must stop producing decode events while a
/// confirmation is pending and start again once the session returns to
/// idle. Implementations just forward commands; they never block.
pub trait CaptureControl: Send + Sync {
    fn pause(&self);
    fn resume(&self);
}

/// Externally visible session phase
///
/// The transient decode / duplicate-check / persist legs run to
/// completion inside the async calls; the session only rests in these
/// phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    ConfirmingNew,
    ConfirmingOverwrite,
}

/// Result of a successful scan, surfaced to the operator for a decision
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub identity: StudentIdentity,
    pub key: RecordKey,
    /// Prior record at this key today, if any; its status, time, and
    /// recording operator drive the overwrite-or-cancel dialog
    pub existing: Option<AttendanceRecord>,
}

/// Decision captured at decode time, held until confirm or cancel
#[derive(Debug, Clone)]
struct PendingScan {
    identity: StudentIdentity,
    key: RecordKey,
    existing: Option<AttendanceRecord>,
}

/// Per-operator scan session
pub struct ScanSession<C: CaptureControl> {
    operator: String,
    operator_class: String,
    ledger: Ledger,
    capture: C,
    pending: Option<PendingScan>,
}

impl<C: CaptureControl> ScanSession<C> {
    pub fn new(operator: String, operator_class: String, ledger: Ledger, capture: C) -> Self {
        Self {
            operator,
            operator_class,
            ledger,
            capture,
            pending: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.pending {
            None => SessionPhase::Idle,
            Some(p) if p.existing.is_none() => SessionPhase::ConfirmingNew,
            Some(_) => SessionPhase::ConfirmingOverwrite,
        }
    }

    /// Handle a raw decode event from the device camera
    ///
    /// Pauses capture, decodes the payload, and runs the duplicate check.
    /// On invalid payload or lookup failure the session returns to idle
    /// and capture resumes; nothing is persisted. On success the session
    /// enters a confirming phase with capture still paused.
    pub async fn handle_scan(&mut self, raw: &str) -> Result<ScanOutcome> {
        if self.pending.is_some() {
            // One in-flight cycle per device; the UI blocks new scans
            // while a confirmation is open.
            return Err(Error::InvalidState(
                "a confirmation is already pending".to_string(),
            ));
        }

        self.capture.pause();

        let identity = match decode_payload(raw) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Rejected scan payload from {}: {}", self.operator, e);
                self.capture.resume();
                return Err(e);
            }
        };

        let resolution = match resolver::resolve(&self.ledger, &identity, today()).await {
            Ok(resolution) => resolution,
            Err(e) => {
                // Fail closed: without a definitive answer, confirmation
                // stays blocked. The operator retries by re-scanning.
                warn!("Duplicate check failed for {}: {}", self.operator, e);
                self.capture.resume();
                return Err(e);
            }
        };

        let (key, existing) = match resolution {
            Resolution::New { key } => (key, None),
            Resolution::Existing { key, record } => (key, Some(record)),
        };

        debug!(
            "Scan by {} resolved {} ({})",
            self.operator,
            key,
            if existing.is_some() { "existing" } else { "new" }
        );

        self.pending = Some(PendingScan {
            identity: identity.clone(),
            key: key.clone(),
            existing: existing.clone(),
        });

        Ok(ScanOutcome {
            identity,
            key,
            existing,
        })
    }

    /// Persist the pending scan with the operator's chosen status
    ///
    /// Uses the identity and key captured at decode time, never
    /// re-derived. On success the session returns to idle and capture
    /// resumes. On a write failure the pending decision is kept so the
    /// operator can retry without re-scanning; capture stays paused.
    pub async fn confirm(&mut self, status: AttendanceStatus) -> Result<AttendanceRecord> {
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no scan awaiting confirmation".to_string()))?;

        let instant = CaptureInstant::now();
        let record = AttendanceRecord {
            key: pending.key.clone(),
            name: pending.identity.name.clone(),
            class: pending.identity.class.clone(),
            gender: pending.identity.gender,
            day: instant.day,
            recorded_at_ms: instant.at_ms,
            recorded_time: instant.formatted_time(),
            status,
            origin: RecordOrigin::Scan,
            recorded_by: self.operator.clone(),
            recorded_by_class: self.operator_class.clone(),
        };

        self.ledger
            .upsert(&record)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        info!(
            "Recorded {} for {} by {} ({})",
            record.status, record.name, record.recorded_by, record.origin
        );

        self.pending = None;
        self.capture.resume();
        Ok(record)
    }

    /// Discard the pending scan with no ledger mutation
    pub fn cancel(&mut self) -> Result<()> {
        if self.pending.take().is_none() {
            return Err(Error::InvalidState(
                "no scan awaiting confirmation".to_string(),
            ));
        }
        debug!("Scan cancelled by {}", self.operator);
        self.capture.resume();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presensi_common::db::init::create_tables;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockCapture {
        pauses: Arc<AtomicU32>,
        resumes: Arc<AtomicU32>,
    }

    impl CaptureControl for MockCapture {
        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
        fn resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn setup() -> (Ledger, ScanSession<MockCapture>, MockCapture) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        let ledger = Ledger::new(pool);
        let capture = MockCapture::default();
        let session = ScanSession::new(
            "u1".to_string(),
            "XII.1".to_string(),
            ledger.clone(),
            capture.clone(),
        );
        (ledger, session, capture)
    }

    const AHMAD: &str = r#"{"nama": "Ahmad", "kelas": "X.1", "gender": "L"}"#;

    #[tokio::test]
    async fn test_new_scan_confirm_creates_record() {
        let (ledger, mut session, capture) = setup().await;

        let outcome = session.handle_scan(AHMAD).await.unwrap();
        assert!(outcome.existing.is_none());
        assert_eq!(session.phase(), SessionPhase::ConfirmingNew);
        assert_eq!(capture.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 0);

        let record = session.confirm(AttendanceStatus::Present).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.recorded_by, "u1");
        assert_eq!(record.origin, RecordOrigin::Scan);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 1);

        let stored = ledger.get(record.day, &record.key).await.unwrap().unwrap();
        assert_eq!(stored.status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn test_invalid_payload_never_persists() {
        let (ledger, mut session, capture) = setup().await;

        let err = session.handle_scan("not json at all").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
        // Capture resumed so scanning continues automatically
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 1);

        let partition = ledger.partition(today()).await.unwrap();
        assert!(partition.is_empty());
    }

    #[tokio::test]
    async fn test_rescan_surfaces_prior_record_and_overwrites() {
        let (ledger, mut session, _capture) = setup().await;

        session.handle_scan(AHMAD).await.unwrap();
        let first = session.confirm(AttendanceStatus::Present).await.unwrap();

        // Second operator scans the same student later the same day
        let capture2 = MockCapture::default();
        let mut session2 = ScanSession::new(
            "u2".to_string(),
            "XII.2".to_string(),
            ledger.clone(),
            capture2,
        );
        let outcome = session2.handle_scan(AHMAD).await.unwrap();
        let prior = outcome.existing.expect("prior record surfaced");
        assert_eq!(prior.recorded_by, "u1");
        assert_eq!(prior.status, AttendanceStatus::Present);
        assert_eq!(session2.phase(), SessionPhase::ConfirmingOverwrite);

        let second = session2.confirm(AttendanceStatus::Excused).await.unwrap();
        assert_eq!(second.key, first.key);

        let partition = ledger.partition(second.day).await.unwrap();
        assert_eq!(partition.len(), 1, "overwrite replaced, never duplicated");
        assert_eq!(partition[0].status, AttendanceStatus::Excused);
        assert_eq!(partition[0].recorded_by, "u2");
    }

    #[tokio::test]
    async fn test_cancel_discards_without_mutation() {
        let (ledger, mut session, capture) = setup().await;

        session.handle_scan(AHMAD).await.unwrap();
        session.cancel().unwrap();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 1);

        assert!(ledger.partition(today()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_without_pending_scan_rejected() {
        let (_ledger, mut session, _capture) = setup().await;
        assert!(matches!(
            session.confirm(AttendanceStatus::Present).await,
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(session.cancel(), Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_pending_and_capture_paused() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        let capture = MockCapture::default();
        let mut session = ScanSession::new(
            "u1".to_string(),
            "XII.1".to_string(),
            Ledger::new(pool.clone()),
            capture.clone(),
        );

        session.handle_scan(AHMAD).await.unwrap();
        // Closing the pool makes the next write fail
        pool.close().await;

        let err = session.confirm(AttendanceStatus::Present).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        // The decision survives so the operator retries without re-scanning
        assert_eq!(session.phase(), SessionPhase::ConfirmingNew);
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        let capture = MockCapture::default();
        let mut session = ScanSession::new(
            "u1".to_string(),
            "XII.1".to_string(),
            Ledger::new(pool.clone()),
            capture.clone(),
        );

        pool.close().await;

        // A failed duplicate check is never treated as "no duplicate"
        let err = session.handle_scan(AHMAD).await.unwrap_err();
        assert!(matches!(err, Error::Lookup(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
        // Capture resumed so the operator can retry by re-scanning
        assert_eq!(capture.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(capture.resumes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scan_blocked_while_confirmation_pending() {
        let (_ledger, mut session, capture) = setup().await;

        session.handle_scan(AHMAD).await.unwrap();
        let err = session.handle_scan(AHMAD).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        // The blocked scan must not touch capture state
        assert_eq!(capture.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(session.phase(), SessionPhase::ConfirmingNew);
    }
}
