//! The vote ledger: a persisted set of record numbers

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use super::storage::{FileLedgerStorage, LedgerStorage, MemoryLedgerStorage};
use crate::error::{FeedbackError, Result};

/// Record numbers this device has a confirmed vote for.
///
/// Loaded lazily from storage on first use. Unreadable or corrupt storage
/// degrades to an empty set. Entries never expire; [`VoteLedger::clear`]
/// is the only removal and it does not touch remote counts.
///
/// # Example
///
/// ```rust,ignore
/// use feedback_sdk::VoteLedger;
///
/// let ledger = VoteLedger::open("/data/feedback/voted.json");
/// if !ledger.has_voted(42).await {
///     // ... remote increment succeeded ...
///     ledger.record_vote(42).await?;
/// }
/// ```
pub struct VoteLedger {
    storage: Arc<dyn LedgerStorage>,
    /// `None` until loaded
    voted: Mutex<Option<BTreeSet<u64>>>,
}

impl VoteLedger {
    /// Create a ledger over any storage backend
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            voted: Mutex::new(None),
        }
    }

    /// File-backed ledger at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileLedgerStorage::new(path)))
    }

    /// Ledger that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryLedgerStorage::new()))
    }

    /// Whether this device already voted for `number`
    pub async fn has_voted(&self, number: u64) -> bool {
        self.loaded().await.as_ref().is_some_and(|set| set.contains(&number))
    }

    /// Remember a confirmed vote. Idempotent; returns whether the entry is new.
    ///
    /// The in-memory entry is kept even if persisting fails, so this
    /// process still refuses a second vote.
    pub async fn record_vote(&self, number: u64) -> Result<bool> {
        let mut guard = self.loaded().await;
        let set = guard.get_or_insert_with(BTreeSet::new);
        if !set.insert(number) {
            return Ok(false);
        }

        let data = encode(set)?;
        self.storage.save(&data).await?;
        tracing::debug!(number, total = set.len(), "Recorded vote in ledger");
        Ok(true)
    }

    /// Snapshot of every recorded vote
    pub async fn list_voted(&self) -> BTreeSet<u64> {
        self.loaded().await.clone().unwrap_or_default()
    }

    /// Forget every recorded vote. Remote counts are not decremented.
    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.voted.lock().await;
        *guard = Some(BTreeSet::new());
        self.storage.remove().await?;
        tracing::info!("Cleared vote ledger");
        Ok(())
    }

    async fn loaded(&self) -> MutexGuard<'_, Option<BTreeSet<u64>>> {
        let mut guard = self.voted.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_storage().await);
        }
        guard
    }

    async fn read_storage(&self) -> BTreeSet<u64> {
        match self.storage.load().await {
            Ok(Some(data)) => decode(&data).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Vote ledger is corrupt, starting empty");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Vote ledger unreadable, starting empty");
                BTreeSet::new()
            }
        }
    }
}

/// Ledger wire format: JSON array of record numbers
fn encode(set: &BTreeSet<u64>) -> Result<Vec<u8>> {
    serde_json::to_vec(set).map_err(|e| FeedbackError::Ledger(e.to_string()))
}

fn decode(data: &[u8]) -> std::result::Result<BTreeSet<u64>, serde_json::Error> {
    serde_json::from_slice(data)
}
