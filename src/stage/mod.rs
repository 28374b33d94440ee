//! Workflow stages and the label-to-stage matcher.
//!
//! The "current stage" of an issue is not stored anywhere; it is inferred
//! from ambient label membership by a total, pure function over the label
//! set. The priority table below is explicit ordered data — it doubles as
//! the tie-break policy when an issue carries more than one stage label
//! (a defensive state the non-atomic transition can produce).

pub mod engine;
pub mod scenario;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::StageLabels;

/// Closed enumeration of workflow stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStage {
    Intake,
    Planning,
    QaSpec,
    Implementation,
    Audit,
    ConflictResolution,
    ReadyForTest,
    Docs,
    PullRequest,
    Complete,
    /// No recognized stage label present.
    Error,
}

/// Match order for stage labels. Earlier entries win when multiple stage
/// labels are present. `ConflictResolution` sits at its pipeline position
/// between `Audit` and `ReadyForTest`.
pub const STAGE_PRIORITY: &[WorkflowStage] = &[
    WorkflowStage::Intake,
    WorkflowStage::Planning,
    WorkflowStage::QaSpec,
    WorkflowStage::Implementation,
    WorkflowStage::Audit,
    WorkflowStage::ConflictResolution,
    WorkflowStage::ReadyForTest,
    WorkflowStage::Docs,
    WorkflowStage::PullRequest,
    WorkflowStage::Complete,
];

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Planning => "planning",
            Self::QaSpec => "qa-spec",
            Self::Implementation => "implementation",
            Self::Audit => "audit",
            Self::ConflictResolution => "conflict-resolution",
            Self::ReadyForTest => "ready-for-test",
            Self::Docs => "docs",
            Self::PullRequest => "pull-request",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// The configured label name for this stage. `Error` has no label.
    pub fn label<'a>(&self, labels: &'a StageLabels) -> Option<&'a str> {
        match self {
            Self::Intake => Some(&labels.intake),
            Self::Planning => Some(&labels.planning),
            Self::QaSpec => Some(&labels.qa_spec),
            Self::Implementation => Some(&labels.implementation),
            Self::Audit => Some(&labels.audit),
            Self::ConflictResolution => Some(&labels.conflict_resolution),
            Self::ReadyForTest => Some(&labels.ready_for_test),
            Self::Docs => Some(&labels.docs),
            Self::PullRequest => Some(&labels.pull_request),
            Self::Complete => Some(&labels.complete),
            Self::Error => None,
        }
    }

    /// The stage that follows this one in the fixed pipeline order.
    /// Terminal and error states have no successor.
    pub fn next(&self) -> Option<WorkflowStage> {
        let idx = STAGE_PRIORITY.iter().position(|s| s == self)?;
        STAGE_PRIORITY.get(idx + 1).copied()
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(Self::Intake),
            "planning" => Ok(Self::Planning),
            "qa-spec" => Ok(Self::QaSpec),
            "implementation" => Ok(Self::Implementation),
            "audit" => Ok(Self::Audit),
            "conflict-resolution" => Ok(Self::ConflictResolution),
            "ready-for-test" => Ok(Self::ReadyForTest),
            "docs" => Ok(Self::Docs),
            "pull-request" => Ok(Self::PullRequest),
            "complete" => Ok(Self::Complete),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

/// Infer the current stage from an issue's label set. Total and pure:
/// returns the first priority-table entry whose configured label is present,
/// or `Error` when no stage label is recognized.
pub fn stage_from_labels(issue_labels: &[String], config: &StageLabels) -> WorkflowStage {
    for stage in STAGE_PRIORITY {
        if let Some(label) = stage.label(config)
            && issue_labels.iter().any(|l| l == label)
        {
            return *stage;
        }
    }
    WorkflowStage::Error
}
