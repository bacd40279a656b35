//! Submitting feedback and casting deduplicated votes

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use feedback_tracker_client::{GitHubClient, IssueTracker};

use crate::config::FeedbackConfig;
use crate::error::{FeedbackError, Result};
use crate::ledger::VoteLedger;
use crate::model::NewFeedback;
use crate::store::RecordStore;

/// Entry point for the two user actions: submit and vote.
///
/// Votes are deduplicated per device through the [`VoteLedger`]. The ledger
/// check, the remote increment and the ledger update for one record run
/// under a per-record lock, so two taps on the same record from this
/// process produce at most one increment.
pub struct FeedbackSubmission {
    store: Arc<RecordStore>,
    ledger: Arc<VoteLedger>,
    vote_locks: StdMutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl FeedbackSubmission {
    pub fn new(store: Arc<RecordStore>, ledger: Arc<VoteLedger>) -> Self {
        Self {
            store,
            ledger,
            vote_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Wire a GitHub-backed store and a file ledger from configuration
    pub fn from_config(config: &FeedbackConfig) -> Result<Self> {
        config.validate()?;
        let client = GitHubClient::new(config.tracker.clone())
            .map_err(|e| FeedbackError::Config(e.to_string()))?;
        let tracker: Arc<dyn IssueTracker> = Arc::new(client);

        Ok(Self::new(
            Arc::new(RecordStore::new(tracker)),
            Arc::new(VoteLedger::open(&config.ledger.path)),
        ))
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<VoteLedger> {
        &self.ledger
    }

    /// Create a feedback record and return its number
    pub async fn submit_feedback(&self, feedback: &NewFeedback) -> Result<u64> {
        self.store.create_record(feedback).await
    }

    /// Vote for a record once per device and return the new count.
    ///
    /// Fails with [`FeedbackError::AlreadyVoted`] without any remote call
    /// when the ledger already holds `number`. The ledger entry is added
    /// only after the remote increment succeeded; a failure to persist it
    /// is logged and the vote still counts.
    pub async fn cast_vote(&self, number: u64) -> Result<u64> {
        let lock = self.vote_lock(number);
        let result = {
            let _guard = lock.lock().await;
            self.cast_vote_locked(number).await
        };
        self.release_vote_lock(number, lock);
        result
    }

    async fn cast_vote_locked(&self, number: u64) -> Result<u64> {
        if self.ledger.has_voted(number).await {
            debug!(number, "Vote already recorded on this device");
            return Err(FeedbackError::AlreadyVoted(number));
        }

        let count = self.store.upvote(number).await?;

        if let Err(e) = self.ledger.record_vote(number).await {
            warn!(number, error = %e, "Vote counted but the ledger could not be saved");
        }
        info!(number, count, "Vote cast");
        Ok(count)
    }

    pub async fn has_voted(&self, number: u64) -> bool {
        self.ledger.has_voted(number).await
    }

    pub async fn voted_records(&self) -> BTreeSet<u64> {
        self.ledger.list_voted().await
    }

    /// Forget local votes. Remote counts are untouched.
    pub async fn reset_votes(&self) -> Result<()> {
        self.ledger.clear().await
    }

    fn vote_lock(&self, number: u64) -> Arc<Mutex<()>> {
        let mut locks = self.vote_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(number).or_default().clone()
    }

    fn release_vote_lock(&self, number: u64, lock: Arc<Mutex<()>>) {
        let mut locks = self.vote_locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller still hold it.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStorage;
    use crate::model::Category;
    use feedback_tracker_client::{Issue, MockOperation, MockTracker};

    fn setup(votes: u64) -> (Arc<MockTracker>, Arc<MemoryLedgerStorage>, Arc<FeedbackSubmission>) {
        let tracker = Arc::new(MockTracker::new().with_issue(
            Issue::new(42, "Dark mode")
                .with_body(format!("Please\n\n---\n👍 Votes: {}", votes))
                .with_labels(&["feature-request"]),
        ));
        let storage = Arc::new(MemoryLedgerStorage::new());
        let submission = FeedbackSubmission::new(
            Arc::new(RecordStore::new(tracker.clone())),
            Arc::new(VoteLedger::new(storage.clone())),
        );
        (tracker, storage, Arc::new(submission))
    }

    fn votes(tracker: &MockTracker, number: u64) -> u64 {
        crate::codec::parse_vote_count(tracker.issue(number).unwrap().body.as_deref())
    }

    #[tokio::test]
    async fn test_first_vote_increments_and_records() {
        let (tracker, storage, submission) = setup(5);

        assert_eq!(submission.cast_vote(42).await.unwrap(), 6);
        assert_eq!(votes(&tracker, 42), 6);
        assert!(submission.has_voted(42).await);
        assert_eq!(storage.snapshot().unwrap(), b"[42]".to_vec());
    }

    #[tokio::test]
    async fn test_second_vote_makes_no_remote_call() {
        let (tracker, _, submission) = setup(5);
        submission.cast_vote(42).await.unwrap();
        tracker.reset_call_counts();

        let err = submission.cast_vote(42).await.unwrap_err();

        assert!(matches!(err, FeedbackError::AlreadyVoted(42)));
        assert!(err.is_already_voted());
        assert_eq!(tracker.total_calls(), 0);
        assert_eq!(votes(&tracker, 42), 6);
    }

    #[tokio::test]
    async fn test_failed_vote_leaves_ledger_unchanged() {
        let (tracker, storage, submission) = setup(5);
        tracker.fail(MockOperation::Update);

        let err = submission.cast_vote(42).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Update { .. }));
        assert!(!submission.has_voted(42).await);
        assert!(storage.snapshot().is_none());

        // A retry after recovery goes through.
        tracker.recover(MockOperation::Update);
        assert_eq!(submission.cast_vote(42).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_unknown_record_is_fetch_error() {
        let (_, _, submission) = setup(0);
        let err = submission.cast_vote(7).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Fetch(_)));
        assert!(!submission.has_voted(7).await);
    }

    #[tokio::test]
    async fn test_concurrent_votes_increment_once() {
        let (tracker, _, submission) = setup(5);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let submission = submission.clone();
                tokio::spawn(async move { submission.cast_vote(42).await })
            })
            .collect();

        let mut accepted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(count) => {
                    assert_eq!(count, 6);
                    accepted += 1;
                }
                Err(FeedbackError::AlreadyVoted(42)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(votes(&tracker, 42), 6);
        assert_eq!(tracker.call_count(MockOperation::Update), 1);
        assert!(submission.vote_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_allows_voting_again() {
        let (tracker, _, submission) = setup(1);
        submission.cast_vote(42).await.unwrap();

        submission.reset_votes().await.unwrap();
        assert!(submission.voted_records().await.is_empty());

        assert_eq!(submission.cast_vote(42).await.unwrap(), 3);
        assert_eq!(votes(&tracker, 42), 3);
    }

    #[tokio::test]
    async fn test_submit_then_vote() {
        let (tracker, _, submission) = setup(0);

        let draft = NewFeedback::new("Crash on launch", "It crashes", Category::Bug)
            .with_device_info("Platform: ios")
            .with_contact_email("me@example.com");
        let number = submission.submit_feedback(&draft).await.unwrap();

        assert_eq!(votes(&tracker, number), 0);
        assert_eq!(submission.cast_vote(number).await.unwrap(), 1);
        assert_eq!(submission.voted_records().await, BTreeSet::from([number]));
    }
}
