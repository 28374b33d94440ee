//! Forge client seam: the types and trait through which the engine talks to
//! the hosted issue/PR/label store.
//!
//! The forge is the only persistence layer — the engine never caches issue
//! state across invocations. All types here are read-only snapshots valid at
//! the instant they were fetched.

pub mod fake;
pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ForgeError;

/// Prefix shared by every comment the engine posts. The machine markers
/// extend it (`<!-- stagehand:transition`, `<!-- stagehand:specification`);
/// plain status comments carry [`ENGINE_SIGNATURE`].
pub const ENGINE_COMMENT_PREFIX: &str = "<!-- stagehand";

/// Hidden signature appended to human-readable engine comments. On a real
/// forge the engine's comments arrive under whatever account the token
/// authenticates as, so authorship alone cannot identify them.
pub const ENGINE_SIGNATURE: &str = "<!-- stagehand -->";

/// Append the engine signature to a comment body.
pub fn sign_comment(body: &str) -> String {
    format!("{}\n\n{}", body, ENGINE_SIGNATURE)
}

/// True when a comment body was left by the engine itself.
pub fn is_engine_comment(body: &str) -> bool {
    body.contains(ENGINE_COMMENT_PREFIX)
}

/// True when `body` references issue `number` as `#N` and the match is not
/// the prefix of a longer number (`#50` does not reference issue 5).
pub fn references_issue(body: &str, number: u64) -> bool {
    let needle = format!("#{}", number);
    let mut rest = body;
    while let Some(idx) = rest.find(&needle) {
        let after = &rest[idx + needle.len()..];
        if !after.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
            return true;
        }
        rest = after;
    }
    false
}

/// Open/closed state of an issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Read-only view of an issue at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    /// Label names in the order the forge reports them.
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl IssueSnapshot {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A pull request (subset of fields the engine cares about).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub head_ref: String,
    pub base_ref: String,
    /// Logins of reviewers requested at query time.
    pub requested_reviewers: Vec<String>,
}

/// One changed file in a pull request diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestFile {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
}

impl PullRequestFile {
    pub fn lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// A check run attached to a commit ref.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    /// `success`, `failure`, `neutral`, ... — absent while still running.
    pub conclusion: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One event from an issue's timeline (labeled, unlabeled, closed, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event: String,
    pub actor: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated facade over the hosting API. The engine depends on this
/// exclusively for all durable effects.
#[async_trait]
pub trait ForgeClient: Send + Sync {
    async fn get_issue(&self, number: u64) -> Result<IssueSnapshot, ForgeError>;

    async fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>, ForgeError>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), ForgeError>;

    /// Create a new issue; returns its number.
    async fn create_issue(&self, title: &str, body: &str) -> Result<u64, ForgeError>;

    async fn add_labels(&self, number: u64, names: &[String]) -> Result<(), ForgeError>;

    /// Removing a label that is not present is not an error on the forge
    /// side; implementations mirror that.
    async fn remove_label(&self, number: u64, name: &str) -> Result<(), ForgeError>;

    async fn list_timeline(&self, number: u64) -> Result<Vec<TimelineEvent>, ForgeError>;

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError>;

    async fn list_pull_request_files(
        &self,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, ForgeError>;

    /// Check runs for a commit ref (branch name or SHA).
    async fn list_check_runs(&self, git_ref: &str) -> Result<Vec<CheckRun>, ForgeError>;

    /// Open pull requests whose body references the given issue number
    /// (`#N` appearing in the body text; see [`references_issue`]).
    async fn search_open_prs_referencing(
        &self,
        issue_number: u64,
    ) -> Result<Vec<PullRequest>, ForgeError>;
}
