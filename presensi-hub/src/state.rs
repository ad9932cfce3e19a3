//! Shared hub state
//!
//! One scan session per operator device, the shared ledger handle, and the
//! broadcast channel feeding SSE clients.

use crate::scan::{CaptureControl, ScanSession};
use presensi_common::db::Ledger;
use presensi_common::events::HubEvent;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

/// Buffered events per SSE subscriber
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Capture control that forwards pause/resume to the operator's device
/// over the SSE event stream
#[derive(Clone)]
pub struct SseCapture {
    operator: String,
    event_tx: broadcast::Sender<HubEvent>,
}

impl CaptureControl for SseCapture {
    fn pause(&self) {
        // No receivers is fine; the device resynchronizes on reconnect
        let _ = self.event_tx.send(HubEvent::CaptureCommand {
            operator: self.operator.clone(),
            pause: true,
            timestamp: chrono::Utc::now(),
        });
    }

    fn resume(&self) {
        let _ = self.event_tx.send(HubEvent::CaptureCommand {
            operator: self.operator.clone(),
            pause: false,
            timestamp: chrono::Utc::now(),
        });
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database pool (roster store)
    pub pool: SqlitePool,
    /// Shared attendance ledger
    pub ledger: Ledger,
    /// Event broadcaster for SSE clients
    event_tx: broadcast::Sender<HubEvent>,
    /// One scan session per operator, created lazily on first scan
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<ScanSession<SseCapture>>>>>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, ledger: Ledger) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            ledger,
            event_tx,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: HubEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the hub event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<HubEvent> {
        self.event_tx.subscribe()
    }

    /// Sender handle for components that broadcast on their own (aggregator)
    pub fn event_sender(&self) -> broadcast::Sender<HubEvent> {
        self.event_tx.clone()
    }

    /// The operator's scan session, created on first use
    ///
    /// Sessions are per operator; each one is locked independently so one
    /// device's pending confirmation never blocks another device.
    pub async fn session(
        &self,
        operator: &str,
        operator_class: &str,
    ) -> Arc<Mutex<ScanSession<SseCapture>>> {
        if let Some(session) = self.sessions.read().await.get(operator) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(operator.to_string())
            .or_insert_with(|| {
                debug!("Creating scan session for operator {}", operator);
                let capture = SseCapture {
                    operator: operator.to_string(),
                    event_tx: self.event_tx.clone(),
                };
                Arc::new(Mutex::new(ScanSession::new(
                    operator.to_string(),
                    operator_class.to_string(),
                    self.ledger.clone(),
                    capture,
                )))
            })
            .clone()
    }

    /// The operator's existing session, if one was created
    pub async fn existing_session(
        &self,
        operator: &str,
    ) -> Option<Arc<Mutex<ScanSession<SseCapture>>>> {
        self.sessions.read().await.get(operator).cloned()
    }
}
