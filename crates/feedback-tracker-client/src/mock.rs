//! In-memory tracker for tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::error::{Result, TrackerError};
use crate::traits::IssueTracker;
use crate::types::*;

/// Tracker operations, used for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    List,
    Create,
    Get,
    Update,
    ListComments,
    AddComment,
    AddReaction,
}

impl MockOperation {
    const ALL: [MockOperation; 7] = [
        MockOperation::List,
        MockOperation::Create,
        MockOperation::Get,
        MockOperation::Update,
        MockOperation::ListComments,
        MockOperation::AddComment,
        MockOperation::AddReaction,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Default)]
struct MockState {
    issues: Vec<Issue>,
    comments: HashMap<u64, Vec<Comment>>,
    reactions: HashMap<u64, Vec<ReactionKind>>,
    failing: HashSet<MockOperation>,
    /// One-shot body replacement applied right after the next fetch of an
    /// issue, to stand in for a concurrent writer.
    write_after_get: HashMap<u64, String>,
    next_number: u64,
    next_id: u64,
    clock: u64,
}

/// Mock tracker for testing.
///
/// Behaves like a single repository: label filters use AND semantics,
/// lists are open-only and newest first.
pub struct MockTracker {
    state: Mutex<MockState>,
    calls: [AtomicU32; 7],
    conditional_updates: AtomicBool,
}

impl MockTracker {
    /// Create an empty mock tracker.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_number: 1,
                next_id: 1_000,
                ..Default::default()
            }),
            calls: Default::default(),
            conditional_updates: AtomicBool::new(false),
        }
    }

    /// Seed an issue.
    pub fn with_issue(self, issue: Issue) -> Self {
        self.insert_issue(issue);
        self
    }

    /// Offer conditional body updates.
    pub fn with_conditional_updates(self, enabled: bool) -> Self {
        self.conditional_updates.store(enabled, Ordering::SeqCst);
        self
    }

    /// Insert or replace an issue by number.
    pub fn insert_issue(&self, issue: Issue) {
        let mut state = self.lock();
        state.next_number = state.next_number.max(issue.number + 1);
        state.issues.retain(|i| i.number != issue.number);
        state.issues.push(issue);
    }

    /// Current stored copy of an issue.
    pub fn issue(&self, number: u64) -> Option<Issue> {
        self.lock().issues.iter().find(|i| i.number == number).cloned()
    }

    /// Reactions recorded for an issue.
    pub fn reactions(&self, number: u64) -> Vec<ReactionKind> {
        self.lock().reactions.get(&number).cloned().unwrap_or_default()
    }

    /// Make every subsequent call of `op` fail with a 500.
    pub fn fail(&self, op: MockOperation) {
        self.lock().failing.insert(op);
    }

    /// Undo [`MockTracker::fail`].
    pub fn recover(&self, op: MockOperation) {
        self.lock().failing.remove(&op);
    }

    /// After the next `get_issue(number)` returns, replace that issue's
    /// body with `body` as if another client had written in between.
    pub fn write_after_next_get(&self, number: u64, body: impl Into<String>) {
        self.lock().write_after_get.insert(number, body.into());
    }

    /// Number of times `op` was invoked (including failed calls).
    pub fn call_count(&self, op: MockOperation) -> u32 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Total number of remote calls of any kind.
    pub fn total_calls(&self) -> u32 {
        MockOperation::ALL.iter().map(|op| self.call_count(*op)).sum()
    }

    /// Reset all call counters.
    pub fn reset_call_counts(&self) {
        for counter in &self.calls {
            counter.store(0, Ordering::SeqCst);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not poison the mock for the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self, op: MockOperation) -> Result<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        if self.lock().failing.contains(&op) {
            return Err(TrackerError::Server {
                status: 500,
                message: format!("injected failure for {:?}", op),
            });
        }
        Ok(())
    }

    fn tick(state: &mut MockState) -> String {
        state.clock += 1;
        let c = state.clock;
        format!(
            "2099-01-01T{:02}:{:02}:{:02}Z",
            (c / 3600) % 24,
            (c / 60) % 60,
            c % 60
        )
    }

    fn not_found(number: u64) -> TrackerError {
        TrackerError::NotFound(format!("issue #{}", number))
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn list_issues(&self, labels: &[String]) -> Result<Vec<Issue>> {
        self.enter(MockOperation::List)?;

        let state = self.lock();
        let mut issues: Vec<Issue> = state
            .issues
            .iter()
            .filter(|i| i.is_open())
            .filter(|i| labels.iter().all(|l| i.has_label(l)))
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(issues)
    }

    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue> {
        self.enter(MockOperation::Create)?;

        let mut state = self.lock();
        let number = state.next_number;
        state.next_number += 1;
        let id = state.next_id;
        state.next_id += 1;
        let now = Self::tick(&mut state);

        let issue = Issue {
            id,
            number,
            title: title.to_string(),
            body: Some(body.to_string()),
            state: "open".to_string(),
            labels: labels.iter().map(Label::named).collect(),
            created_at: now.clone(),
            updated_at: now,
            user: Some(User {
                login: "feedback-bot".to_string(),
                avatar_url: None,
            }),
            pull_request: None,
        };
        state.issues.push(issue.clone());
        Ok(issue)
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        self.enter(MockOperation::Get)?;

        let mut state = self.lock();
        let pending = state.write_after_get.remove(&number);
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Self::not_found(number))?;
        let snapshot = issue.clone();
        if let Some(body) = pending {
            issue.body = Some(body);
        }
        Ok(snapshot)
    }

    async fn update_issue_body(&self, number: u64, body: &str) -> Result<()> {
        self.enter(MockOperation::Update)?;

        let mut state = self.lock();
        let now = Self::tick(&mut state);
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Self::not_found(number))?;
        issue.body = Some(body.to_string());
        issue.updated_at = now;
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.enter(MockOperation::ListComments)?;

        let state = self.lock();
        if !state.issues.iter().any(|i| i.number == number) {
            return Err(Self::not_found(number));
        }
        Ok(state.comments.get(&number).cloned().unwrap_or_default())
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<Comment> {
        self.enter(MockOperation::AddComment)?;

        let mut state = self.lock();
        if !state.issues.iter().any(|i| i.number == number) {
            return Err(Self::not_found(number));
        }
        let id = state.next_id;
        state.next_id += 1;
        let comment = Comment {
            id,
            body: body.to_string(),
            user: None,
            created_at: Self::tick(&mut state),
            updated_at: None,
        };
        state.comments.entry(number).or_default().push(comment.clone());
        Ok(comment)
    }

    async fn add_reaction(&self, number: u64, kind: ReactionKind) -> Result<()> {
        self.enter(MockOperation::AddReaction)?;

        let mut state = self.lock();
        if !state.issues.iter().any(|i| i.number == number) {
            return Err(Self::not_found(number));
        }
        state.reactions.entry(number).or_default().push(kind);
        Ok(())
    }

    fn supports_conditional_update(&self) -> bool {
        self.conditional_updates.load(Ordering::SeqCst)
    }

    async fn update_issue_body_if_unchanged(
        &self,
        number: u64,
        expected: &str,
        body: &str,
    ) -> Result<bool> {
        if !self.supports_conditional_update() {
            return Err(TrackerError::Unsupported("conditional body update".to_string()));
        }
        self.enter(MockOperation::Update)?;

        let mut state = self.lock();
        let now = Self::tick(&mut state);
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Self::not_found(number))?;
        if issue.body.as_deref().unwrap_or_default() != expected {
            return Ok(false);
        }
        issue.body = Some(body.to_string());
        issue.updated_at = now;
        Ok(true)
    }
}
