//! Scripted [`GitOps`] used by unit and integration tests.
//!
//! Returns a fixed merge-simulation text and scripted rebase/push outcomes,
//! and records the sequence of calls so tests can assert ordering (e.g.
//! that a stopped rebase never reaches the push).

use std::sync::Mutex;

use async_trait::async_trait;

use super::{GitOps, Workdir};
use crate::errors::GitOpsError;

pub struct ScriptedGit {
    pub simulation: String,
    pub rebase_clean: bool,
    pub fail_clone: bool,
    pub fail_push: bool,
    /// stderr carried by scripted command failures.
    pub failure_stderr: String,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedGit {
    pub fn new(simulation: &str) -> Self {
        Self {
            simulation: simulation.to_string(),
            rebase_clean: true,
            fail_clone: false,
            fail_push: false,
            failure_stderr: "scripted failure".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose merge simulation always comes back clean.
    pub fn clean() -> Self {
        Self::new("Merge simulation clean: no conflicts\n")
    }

    fn log(&self, call: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn command_failed(&self, command: &str) -> GitOpsError {
        GitOpsError::CommandFailed {
            command: command.to_string(),
            code: 1,
            stderr: self.failure_stderr.clone(),
        }
    }
}

#[async_trait]
impl GitOps for ScriptedGit {
    async fn merge_base(&self, _base: &str, _head: &str) -> Result<String, GitOpsError> {
        self.log("merge_base");
        Ok("0000000000000000000000000000000000000000".to_string())
    }

    async fn simulate_merge(&self, _base: &str, _head: &str) -> Result<String, GitOpsError> {
        self.log("simulate_merge");
        Ok(self.simulation.clone())
    }

    async fn clone_and_checkout(&self, _branch: &str) -> Result<Workdir, GitOpsError> {
        self.log("clone");
        if self.fail_clone {
            return Err(self.command_failed("clone"));
        }
        Workdir::scratch().map_err(|source| GitOpsError::SpawnFailed {
            command: "clone".to_string(),
            source,
        })
    }

    async fn rebase(&self, _workdir: &Workdir, _onto: &str) -> Result<bool, GitOpsError> {
        self.log("rebase");
        Ok(self.rebase_clean)
    }

    async fn push(&self, _workdir: &Workdir, _branch: &str) -> Result<(), GitOpsError> {
        self.log("push");
        if self.fail_push {
            return Err(self.command_failed("push"));
        }
        Ok(())
    }
}
