//! Database access layer
//!
//! Schema initialization, the attendance ledger, and the master roster
//! store.

pub mod init;
pub mod ledger;
pub mod roster;

pub use init::init_database;
pub use ledger::Ledger;
