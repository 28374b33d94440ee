//! Typed error hierarchy for the stagehand engine.
//!
//! Three top-level enums cover the three failure surfaces:
//! - `ForgeError` — forge API failures (network, not-found, malformed responses)
//! - `GitOpsError` — local git operation failures (merge analysis, clone/rebase/push)
//! - `EngineError` — anything that can abort a `process_issue` pass
//!
//! Absence-of-data conditions (no PR referencing an issue, no specification
//! comment, no matching check run) are not errors; they degrade to default
//! values inside verdicts. Policy outcomes (audit says no, conflicts not
//! auto-resolvable) are `Ok` results carrying the "no".

use thiserror::Error;

/// Errors from the forge client (hosted issue/PR/label store).
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Issue #{number} not found")]
    IssueNotFound { number: u64 },

    #[error("Pull request #{number} not found")]
    PullRequestNotFound { number: u64 },

    #[error("Forge API returned status {status} for {endpoint}")]
    Api { endpoint: String, status: u16 },

    #[error("Malformed forge response for {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },

    #[error("Forge transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Errors from local git operations used by conflict detection/resolution.
#[derive(Debug, Error)]
pub enum GitOpsError {
    #[error("Failed to resolve ref '{reference}'")]
    RefNotFound {
        reference: String,
        #[source]
        source: git2::Error,
    },

    #[error("No merge base between '{base}' and '{head}'")]
    NoMergeBase { base: String, head: String },

    #[error("git {command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to spawn git {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Errors that abort a stage-engine pass. Forge failures propagate
/// unmodified so a retried invocation resumes from the same stage.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Forge(#[from] ForgeError),

    #[error(transparent)]
    Git(#[from] GitOpsError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
