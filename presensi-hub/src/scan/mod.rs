//! Scan path: duplicate resolution and the per-operator scan session

pub mod resolver;
pub mod session;

pub use resolver::{resolve, Resolution};
pub use session::{CaptureControl, ScanOutcome, ScanSession, SessionPhase};
