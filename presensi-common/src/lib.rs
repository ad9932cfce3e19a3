//! # Presensi Common Library (presensi-common)
//!
//! Shared types and storage for the Presensi attendance system.
//!
//! **Purpose:** Decode scanned QR identity payloads, derive deterministic
//! record keys, and maintain the per-day attendance ledger that every
//! operator device writes through.
//!
//! **Architecture:** SQLite-backed ledger (sqlx) with a broadcast channel
//! that pushes full day-partition snapshots to subscribers on every upsert.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod identity;
pub mod key;
pub mod record;
pub mod time;

pub use error::{Error, Result};
pub use identity::{decode_payload, Gender, StudentIdentity};
pub use key::RecordKey;
pub use record::{AttendanceRecord, AttendanceStatus, MasterStudent, OfficerStat, RecordOrigin};
