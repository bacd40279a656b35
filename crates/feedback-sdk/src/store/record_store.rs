//! Listing, creation and vote increments against the tracker

use feedback_tracker_client::{Comment, IssueTracker, ReactionKind};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::StoreState;
use crate::codec;
use crate::error::{FeedbackError, Result};
use crate::model::{NewFeedback, Record, RecordFilter};

/// Remote record store with an observable local cache.
///
/// The cache only ever holds the last successful listing, plus records
/// created since. It is replaced wholesale, never patched in place.
///
/// # Vote increments
///
/// [`RecordStore::upvote`] is a read-modify-write of the record body. On a
/// tracker without conditional updates two clients voting at the same time
/// can both read `N` and both write `N + 1`, losing a vote. Trackers that
/// support conditional updates turn that race into an `Update` error.
///
/// # Example
///
/// ```rust,ignore
/// use feedback_sdk::{RecordFilter, RecordStore};
///
/// let store = RecordStore::new(Arc::new(github));
/// let mut changes = store.subscribe();
///
/// store.list_records(RecordFilter::Bugs).await?;
/// for record in &changes.borrow_and_update().records {
///     println!("#{} {} ({} votes)", record.number, record.title, record.vote_count());
/// }
/// ```
pub struct RecordStore {
    tracker: Arc<dyn IssueTracker>,
    state: watch::Sender<StoreState>,
}

impl RecordStore {
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self { tracker, state }
    }

    /// Observe cache changes
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Current cache snapshot
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Cached records in listing order
    pub fn records(&self) -> Vec<Record> {
        self.state.borrow().records.clone()
    }

    pub fn tracker(&self) -> &Arc<dyn IssueTracker> {
        &self.tracker
    }

    /// List open records in `filter`, most voted first, ties newest first.
    ///
    /// Replaces the cache on success. On failure the previous records stay
    /// and the error message is published in [`StoreState::error`].
    pub async fn list_records(&self, filter: RecordFilter) -> Result<Vec<Record>> {
        self.state.send_modify(|s| s.loading = true);

        let issues = match self.tracker.list_issues(&filter.server_labels()).await {
            Ok(issues) => issues,
            Err(e) => {
                warn!(?filter, error = %e, "Failed to list feedback");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                return Err(FeedbackError::Fetch(e));
            }
        };

        let fetched = issues.len();
        let mut records: Vec<Record> = issues
            .into_iter()
            .map(Record::from)
            .filter(|r| filter.matches(r))
            .collect();
        records.sort_by(Record::listing_order);

        info!(?filter, fetched, kept = records.len(), "Listed feedback");

        let listing = records.clone();
        self.state.send_modify(move |s| {
            s.records = listing;
            s.filter = filter;
            s.loading = false;
            s.error = None;
        });
        Ok(records)
    }

    /// Create a record and return its number.
    ///
    /// The record starts with zero votes and is labelled with its category
    /// and `user-submitted`. It is prepended to the cache when it belongs to
    /// the cached listing's filter.
    pub async fn create_record(&self, feedback: &NewFeedback) -> Result<u64> {
        feedback.validate().map_err(FeedbackError::InvalidRequest)?;

        let issue = self
            .tracker
            .create_issue(feedback.title.trim(), &feedback.body(), &feedback.labels())
            .await
            .map_err(|e| {
                warn!(category = %feedback.category, error = %e, "Failed to submit feedback");
                FeedbackError::Create(e)
            })?;

        let record = Record::from(issue);
        let number = record.number;
        info!(number, category = %feedback.category, "Submitted feedback");

        self.state.send_modify(|s| {
            if s.filter.matches(&record) {
                let mut records = Vec::with_capacity(s.records.len() + 1);
                records.push(record);
                records.extend(s.records.iter().filter(|r| r.number != number).cloned());
                s.records = records;
            }
        });
        Ok(number)
    }

    /// Fetch one record fresh from the tracker
    pub async fn fetch_record(&self, number: u64) -> Result<Record> {
        check_number(number)?;
        let issue = self
            .tracker
            .get_issue(number)
            .await
            .map_err(FeedbackError::Fetch)?;
        Ok(issue.into())
    }

    /// Add one vote to a record's embedded counter and return the new count.
    ///
    /// Reads the current body, rewrites the counter and writes the whole
    /// body back. Does not consult or touch the vote ledger, and does not
    /// patch the cache; the next listing shows the new count.
    pub async fn upvote(&self, number: u64) -> Result<u64> {
        check_number(number)?;

        let issue = self
            .tracker
            .get_issue(number)
            .await
            .map_err(FeedbackError::Fetch)?;
        let current = codec::parse_vote_count(issue.body.as_deref());
        let next = current.saturating_add(1);
        let body = codec::rewrite_vote_count(issue.body.as_deref(), next);

        if self.tracker.supports_conditional_update() {
            let expected = issue.body.as_deref().unwrap_or_default();
            let applied = self
                .tracker
                .update_issue_body_if_unchanged(number, expected, &body)
                .await
                .map_err(|e| FeedbackError::update(number, e))?;
            if !applied {
                warn!(number, "Record changed while voting");
                return Err(FeedbackError::Update {
                    number,
                    reason: "record changed since it was read".to_string(),
                    source: None,
                });
            }
        } else {
            self.tracker
                .update_issue_body(number, &body)
                .await
                .map_err(|e| FeedbackError::update(number, e))?;
        }

        info!(number, from = current, to = next, "Upvoted feedback");
        Ok(next)
    }

    /// Discussion comments on a record, oldest first
    pub async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        check_number(number)?;
        self.tracker
            .list_comments(number)
            .await
            .map_err(FeedbackError::Fetch)
    }

    pub async fn add_comment(&self, number: u64, body: &str) -> Result<Comment> {
        check_number(number)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(FeedbackError::InvalidRequest(
                "comment body is required".to_string(),
            ));
        }

        let comment = self
            .tracker
            .add_comment(number, body)
            .await
            .map_err(FeedbackError::Create)?;
        debug!(number, comment_id = comment.id, "Added comment");
        Ok(comment)
    }

    /// Attach an emoji reaction. Reactions do not affect the vote count.
    pub async fn add_reaction(&self, number: u64, kind: ReactionKind) -> Result<()> {
        check_number(number)?;
        self.tracker
            .add_reaction(number, kind)
            .await
            .map_err(FeedbackError::Create)?;
        debug!(number, %kind, "Added reaction");
        Ok(())
    }
}

fn check_number(number: u64) -> Result<()> {
    if number == 0 {
        return Err(FeedbackError::InvalidRequest(
            "record numbers start at 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use feedback_tracker_client::{Issue, MockOperation, MockTracker};

    fn issue(number: u64, labels: &[&str], votes: Option<u64>, created_at: &str) -> Issue {
        let mut issue = Issue::new(number, format!("Feedback {}", number))
            .with_labels(labels)
            .with_created_at(created_at);
        issue.body = Some(match votes {
            Some(v) => codec::rewrite_vote_count(Some("text"), v),
            None => "text".to_string(),
        });
        issue
    }

    fn store_with(tracker: &Arc<MockTracker>) -> RecordStore {
        RecordStore::new(tracker.clone())
    }

    fn numbers(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.number).collect()
    }

    #[tokio::test]
    async fn test_list_all_sorts_and_excludes_unrelated_labels() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_issue(issue(1, &["bug"], Some(3), "2024-01-01T00:00:00Z"))
                .with_issue(issue(2, &["feature-request"], Some(10), "2024-01-02T00:00:00Z"))
                .with_issue(issue(3, &["bug"], Some(3), "2024-01-03T00:00:00Z"))
                .with_issue(issue(4, &["enhancement"], Some(50), "2024-01-04T00:00:00Z"))
                .with_issue(issue(5, &["bug"], None, "2024-01-05T00:00:00Z")),
        );
        let store = store_with(&tracker);

        let records = store.list_records(RecordFilter::All).await.unwrap();

        assert_eq!(numbers(&records), vec![2, 3, 1, 5]);
        assert_eq!(store.records(), records);
        let state = store.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.filter, RecordFilter::All);
    }

    #[tokio::test]
    async fn test_list_bugs_only() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_issue(issue(1, &["bug"], Some(1), "2024-01-01T00:00:00Z"))
                .with_issue(issue(2, &["feature-request"], Some(9), "2024-01-02T00:00:00Z")),
        );
        let store = store_with(&tracker);

        let records = store.list_records(RecordFilter::Bugs).await.unwrap();
        assert_eq!(numbers(&records), vec![1]);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let store = store_with(&Arc::new(MockTracker::new()));
        assert!(store.list_records(RecordFilter::All).await.unwrap().is_empty());
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_failed_list_keeps_previous_records() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(issue(1, &["bug"], Some(1), "2024-01-01T00:00:00Z")),
        );
        let store = store_with(&tracker);
        store.list_records(RecordFilter::All).await.unwrap();

        tracker.fail(MockOperation::List);
        let err = store.list_records(RecordFilter::All).await.unwrap_err();

        assert!(matches!(err, FeedbackError::Fetch(_)));
        let state = store.state();
        assert_eq!(numbers(&state.records), vec![1]);
        assert!(state.error.is_some());
        assert!(!state.loading);

        tracker.recover(MockOperation::List);
        store.list_records(RecordFilter::All).await.unwrap();
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_new_listing() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(issue(7, &["bug"], None, "2024-01-01T00:00:00Z")),
        );
        let store = store_with(&tracker);
        let mut rx = store.subscribe();

        store.list_records(RecordFilter::All).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(numbers(&rx.borrow_and_update().records), vec![7]);
    }

    #[tokio::test]
    async fn test_create_record_body_and_labels() {
        let tracker = Arc::new(MockTracker::new());
        let store = store_with(&tracker);

        let draft = NewFeedback::new("Dark mode", "Great idea!", Category::FeatureRequest)
            .with_device_info("<info>");
        let number = store.create_record(&draft).await.unwrap();

        let stored = tracker.issue(number).unwrap();
        assert_eq!(stored.title, "Dark mode");
        assert_eq!(
            stored.label_names().collect::<Vec<_>>(),
            vec!["feature-request", "user-submitted"]
        );
        let body = stored.body.unwrap();
        assert!(body.starts_with("Great idea!\n\n---\n**Device Information:**\n<info>"));
        assert!(body.ends_with("👍 Votes: 0"));

        let cached = store.records();
        assert_eq!(numbers(&cached), vec![number]);
        assert_eq!(cached[0].vote_count(), 0);
        assert_eq!(cached[0].displayable_body(), "Great idea!");
    }

    #[tokio::test]
    async fn test_create_skips_cache_outside_filter() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(issue(1, &["bug"], None, "2024-01-01T00:00:00Z")),
        );
        let store = store_with(&tracker);
        store.list_records(RecordFilter::Bugs).await.unwrap();

        let draft = NewFeedback::new("Idea", "Something", Category::FeatureRequest);
        store.create_record(&draft).await.unwrap();

        assert_eq!(numbers(&store.records()), vec![1]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_without_remote_call() {
        let tracker = Arc::new(MockTracker::new());
        let store = store_with(&tracker);

        let err = store
            .create_record(&NewFeedback::new("", "text", Category::Bug))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidRequest(_)));
        assert_eq!(tracker.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_create_error() {
        let tracker = Arc::new(MockTracker::new());
        tracker.fail(MockOperation::Create);
        let store = store_with(&tracker);

        let err = store
            .create_record(&NewFeedback::new("t", "d", Category::Bug))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Create(_)));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_upvote_rewrites_only_the_counter() {
        let original = codec::rewrite_vote_count(
            Some(&codec::compose_body("Please add dark mode", "<info>", None)),
            5,
        );
        let tracker = Arc::new(MockTracker::new().with_issue(
            Issue::new(12, "Dark mode")
                .with_body(original.clone())
                .with_labels(&["feature-request"]),
        ));
        let store = store_with(&tracker);

        assert_eq!(store.upvote(12).await.unwrap(), 6);

        let body = tracker.issue(12).unwrap().body.unwrap();
        assert_eq!(body, original.replace("👍 Votes: 5", "👍 Votes: 6"));
        assert_eq!(tracker.call_count(MockOperation::Get), 1);
        assert_eq!(tracker.call_count(MockOperation::Update), 1);
    }

    #[tokio::test]
    async fn test_upvote_appends_counter_to_legacy_body() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(Issue::new(3, "Old").with_body("Legacy report")),
        );
        let store = store_with(&tracker);

        assert_eq!(store.upvote(3).await.unwrap(), 1);
        assert_eq!(
            tracker.issue(3).unwrap().body.as_deref(),
            Some("Legacy report\n\n---\n👍 Votes: 1")
        );
    }

    #[tokio::test]
    async fn test_upvote_failures_leave_record_unchanged() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(Issue::new(4, "x").with_body("x\n\n---\n👍 Votes: 2")),
        );
        let store = store_with(&tracker);

        let err = store.upvote(99).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Fetch(_)));

        tracker.fail(MockOperation::Update);
        let err = store.upvote(4).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Update { number: 4, .. }));
        assert_eq!(tracker.issue(4).unwrap().body.as_deref(), Some("x\n\n---\n👍 Votes: 2"));

        let err = store.upvote(0).await.unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_concurrent_writer_loses_a_vote_without_conditional_update() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(Issue::new(8, "x").with_body("x\n\n---\n👍 Votes: 5")),
        );
        // Another client increments between our read and our write.
        tracker.write_after_next_get(8, "x\n\n---\n👍 Votes: 6");
        let store = store_with(&tracker);

        assert_eq!(store.upvote(8).await.unwrap(), 6);
        assert_eq!(
            tracker.issue(8).unwrap().body.as_deref(),
            Some("x\n\n---\n👍 Votes: 6")
        );
    }

    #[tokio::test]
    async fn test_conditional_update_detects_concurrent_writer() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_conditional_updates(true)
                .with_issue(Issue::new(8, "x").with_body("x\n\n---\n👍 Votes: 5")),
        );
        tracker.write_after_next_get(8, "x\n\n---\n👍 Votes: 6");
        let store = store_with(&tracker);

        let err = store.upvote(8).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Update { number: 8, source: None, .. }));

        // No interference this time.
        assert_eq!(store.upvote(8).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_upvote_does_not_patch_cache() {
        let tracker = Arc::new(
            MockTracker::new().with_issue(issue(1, &["bug"], Some(1), "2024-01-01T00:00:00Z")),
        );
        let store = store_with(&tracker);
        store.list_records(RecordFilter::All).await.unwrap();

        store.upvote(1).await.unwrap();
        assert_eq!(store.records()[0].vote_count(), 1);

        store.list_records(RecordFilter::All).await.unwrap();
        assert_eq!(store.records()[0].vote_count(), 2);
    }

    #[tokio::test]
    async fn test_comments_and_reactions() {
        let tracker = Arc::new(MockTracker::new().with_issue(Issue::new(2, "x")));
        let store = store_with(&tracker);

        assert!(store.list_comments(2).await.unwrap().is_empty());
        store.add_comment(2, "  same here  ").await.unwrap();
        let comments = store.list_comments(2).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "same here");

        assert!(matches!(
            store.add_comment(2, "   ").await,
            Err(FeedbackError::InvalidRequest(_))
        ));

        store.add_reaction(2, ReactionKind::Rocket).await.unwrap();
        assert_eq!(tracker.reactions(2), vec![ReactionKind::Rocket]);
        assert_eq!(codec::parse_vote_count(tracker.issue(2).unwrap().body.as_deref()), 0);

        assert!(matches!(
            store.add_reaction(9, ReactionKind::Heart).await,
            Err(FeedbackError::Create(_))
        ));
    }
}
