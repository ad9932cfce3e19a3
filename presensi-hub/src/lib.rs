//! # Presensi Hub (presensi-hub)
//!
//! Operator-facing attendance service.
//!
//! **Purpose:** Drive per-operator scan sessions (decode, duplicate check,
//! confirmation, persist), accept roster-driven attendance mutations, and
//! derive dashboard aggregates from the shared ledger, pushed to clients
//! over SSE.
//!
//! **Architecture:** axum HTTP API over the presensi-common SQLite ledger;
//! the aggregator subscribes to ledger partition snapshots and rebroadcasts
//! recomputed dashboard state.

pub mod aggregate;
pub mod api;
pub mod roster;
pub mod scan;
pub mod state;

pub use presensi_common::{Error, Result};
