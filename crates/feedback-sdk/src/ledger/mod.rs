//! Per-device vote ledger
//!
//! Remembers which records this device has voted on so the client never
//! issues a second increment. The remote count stays authoritative; the
//! ledger is only a local guard.

mod storage;
mod vote_ledger;

pub use storage::{FileLedgerStorage, LedgerStorage, MemoryLedgerStorage};
pub use vote_ledger::VoteLedger;
