//! In-memory [`ForgeClient`] used by unit and integration tests.
//!
//! Holds issues, comments, pull requests, diffs and check runs behind a
//! mutex so tests can seed state, run the engine, and inspect the resulting
//! labels and comments. Named operations can be made to fail to exercise
//! hard-failure paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    references_issue, CheckRun, ForgeClient, IssueComment, IssueSnapshot, IssueState, PullRequest,
    PullRequestFile, TimelineEvent,
};
use crate::errors::ForgeError;

#[derive(Default)]
struct FakeState {
    issues: HashMap<u64, IssueSnapshot>,
    comments: HashMap<u64, Vec<IssueComment>>,
    pull_requests: HashMap<u64, PullRequest>,
    pr_files: HashMap<u64, Vec<PullRequestFile>>,
    check_runs: HashMap<String, Vec<CheckRun>>,
    timeline: HashMap<u64, Vec<TimelineEvent>>,
    next_comment_id: u64,
    next_issue_number: u64,
    failing_ops: HashSet<String>,
}

/// In-memory forge. Cloneable handles are not needed; share via reference
/// or `Arc`.
#[derive(Default)]
pub struct InMemoryForge {
    state: Mutex<FakeState>,
}

impl InMemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self, op: &str) -> Result<(), ForgeError> {
        if self.lock().failing_ops.contains(op) {
            return Err(ForgeError::Api {
                endpoint: op.to_string(),
                status: 500,
            });
        }
        Ok(())
    }

    // ── seeding ──────────────────────────────────────────────────────

    /// Seed an open issue with the given labels and body.
    pub fn seed_issue(&self, number: u64, title: &str, body: &str, labels: &[&str]) {
        let mut state = self.lock();
        state.issues.insert(
            number,
            IssueSnapshot {
                number,
                title: title.to_string(),
                body: body.to_string(),
                state: IssueState::Open,
                labels: labels.iter().map(|s| s.to_string()).collect(),
                created_at: Utc::now(),
                closed_at: None,
            },
        );
        if number >= state.next_issue_number {
            state.next_issue_number = number + 1;
        }
    }

    pub fn seed_pull_request(&self, pr: PullRequest) {
        self.lock().pull_requests.insert(pr.number, pr);
    }

    pub fn seed_pr_files(&self, pr_number: u64, files: Vec<PullRequestFile>) {
        self.lock().pr_files.insert(pr_number, files);
    }

    pub fn seed_check_run(&self, git_ref: &str, run: CheckRun) {
        self.lock()
            .check_runs
            .entry(git_ref.to_string())
            .or_default()
            .push(run);
    }

    pub fn seed_comment(&self, issue_number: u64, author: &str, body: &str) {
        let mut state = self.lock();
        state.next_comment_id += 1;
        let comment = IssueComment {
            id: state.next_comment_id,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        state.comments.entry(issue_number).or_default().push(comment);
    }

    /// Make the named operation fail with a 500 until cleared.
    pub fn fail_operation(&self, op: &str) {
        self.lock().failing_ops.insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.lock().failing_ops.clear();
    }

    // ── inspection ───────────────────────────────────────────────────

    pub fn labels_of(&self, number: u64) -> Vec<String> {
        self.lock()
            .issues
            .get(&number)
            .map(|i| i.labels.clone())
            .unwrap_or_default()
    }

    pub fn comments_of(&self, number: u64) -> Vec<String> {
        self.lock()
            .comments
            .get(&number)
            .map(|c| c.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn issue_count(&self) -> usize {
        self.lock().issues.len()
    }
}

#[async_trait]
impl ForgeClient for InMemoryForge {
    async fn get_issue(&self, number: u64) -> Result<IssueSnapshot, ForgeError> {
        self.check_failure("get_issue")?;
        self.lock()
            .issues
            .get(&number)
            .cloned()
            .ok_or(ForgeError::IssueNotFound { number })
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>, ForgeError> {
        self.check_failure("list_comments")?;
        Ok(self.lock().comments.get(&number).cloned().unwrap_or_default())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.check_failure("create_comment")?;
        let mut state = self.lock();
        if !state.issues.contains_key(&number) {
            return Err(ForgeError::IssueNotFound { number });
        }
        state.next_comment_id += 1;
        let comment = IssueComment {
            id: state.next_comment_id,
            author: "stagehand".to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        state.comments.entry(number).or_default().push(comment);
        Ok(())
    }

    async fn create_issue(&self, title: &str, body: &str) -> Result<u64, ForgeError> {
        self.check_failure("create_issue")?;
        let mut state = self.lock();
        let number = state.next_issue_number.max(1);
        state.next_issue_number = number + 1;
        state.issues.insert(
            number,
            IssueSnapshot {
                number,
                title: title.to_string(),
                body: body.to_string(),
                state: IssueState::Open,
                labels: Vec::new(),
                created_at: Utc::now(),
                closed_at: None,
            },
        );
        Ok(number)
    }

    async fn add_labels(&self, number: u64, names: &[String]) -> Result<(), ForgeError> {
        self.check_failure("add_labels")?;
        let mut state = self.lock();
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or(ForgeError::IssueNotFound { number })?;
        for name in names {
            if !issue.labels.contains(name) {
                issue.labels.push(name.clone());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, number: u64, name: &str) -> Result<(), ForgeError> {
        self.check_failure("remove_label")?;
        let mut state = self.lock();
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or(ForgeError::IssueNotFound { number })?;
        issue.labels.retain(|l| l != name);
        Ok(())
    }

    async fn list_timeline(&self, number: u64) -> Result<Vec<TimelineEvent>, ForgeError> {
        self.check_failure("list_timeline")?;
        Ok(self.lock().timeline.get(&number).cloned().unwrap_or_default())
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
        self.check_failure("get_pull_request")?;
        self.lock()
            .pull_requests
            .get(&number)
            .cloned()
            .ok_or(ForgeError::PullRequestNotFound { number })
    }

    async fn list_pull_request_files(
        &self,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, ForgeError> {
        self.check_failure("list_pull_request_files")?;
        Ok(self.lock().pr_files.get(&number).cloned().unwrap_or_default())
    }

    async fn list_check_runs(&self, git_ref: &str) -> Result<Vec<CheckRun>, ForgeError> {
        self.check_failure("list_check_runs")?;
        Ok(self
            .lock()
            .check_runs
            .get(git_ref)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_open_prs_referencing(
        &self,
        issue_number: u64,
    ) -> Result<Vec<PullRequest>, ForgeError> {
        self.check_failure("search_open_prs_referencing")?;
        Ok(self
            .lock()
            .pull_requests
            .values()
            .filter(|pr| pr.state == IssueState::Open && references_issue(&pr.body, issue_number))
            .cloned()
            .collect())
    }
}
