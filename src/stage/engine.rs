//! The stage engine: infer the current stage from labels, run that stage's
//! handler, and advance the stage label.
//!
//! Every handler follows the same effect order: post a progress comment,
//! do the stage's work, then move the label. The label move is add-next
//! first, remove-current second, so a crash between the two leaves the
//! issue carrying both labels rather than none; the priority matcher
//! resolves that state on the next pass. Each completed transition also
//! leaves a marker comment so the full stage history can be reconstructed
//! from the comment thread.

use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::audit::evaluator::AuditEvaluator;
use crate::audit::AuditVerdict;
use crate::config::WorkflowConfig;
use crate::conflict::resolver::ConflictResolver;
use crate::conflict::GitOps;
use crate::errors::EngineError;
use crate::forge::{sign_comment, ForgeClient, IssueSnapshot};
use crate::stage::scenario::{derive_scenarios, render_specification_comment};
use crate::stage::{stage_from_labels, WorkflowStage};

/// Marker prefix of the machine-parseable transition comments.
pub const TRANSITION_MARKER: &str = "<!-- stagehand:transition";

static TRANSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!-- stagehand:transition (\S+) ([a-z-]+)->([a-z-]+) -->").unwrap()
});

/// One reconstructed entry of an issue's stage history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub timestamp: String,
    pub from: WorkflowStage,
    pub to: WorkflowStage,
}

/// What one `process_issue` pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    /// The stage the issue was in when the pass started.
    pub stage: WorkflowStage,
    /// The stage the label was advanced to, when it was.
    pub advanced_to: Option<WorkflowStage>,
}

pub struct StageEngine<F: ForgeClient, G: GitOps> {
    forge: Arc<F>,
    config: Arc<WorkflowConfig>,
    evaluator: AuditEvaluator<F>,
    resolver: ConflictResolver<F, G>,
}

impl<F: ForgeClient, G: GitOps> StageEngine<F, G> {
    pub fn new(forge: Arc<F>, git: Arc<G>, config: Arc<WorkflowConfig>) -> Self {
        let evaluator = AuditEvaluator::new(forge.clone(), config.thresholds);
        let resolver = ConflictResolver::new(forge.clone(), git, config.clone());
        Self {
            forge,
            config,
            evaluator,
            resolver,
        }
    }

    /// Run one pass for an issue: infer its stage from labels and execute
    /// that stage's handler. Safe to invoke repeatedly; a pass that fails
    /// midway is resumed by the next invocation from whatever labels
    /// survived.
    pub async fn process_issue(&self, issue_number: u64) -> Result<StageOutcome, EngineError> {
        let issue = self.forge.get_issue(issue_number).await?;
        let stage = stage_from_labels(&issue.labels, &self.config.labels);
        info!(issue = issue_number, stage = %stage, "processing issue");

        let advanced_to = match stage {
            WorkflowStage::Intake => self.handle_intake(&issue).await?,
            WorkflowStage::Planning => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::QaSpec => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::Implementation => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::Audit => self.handle_audit(&issue).await?,
            WorkflowStage::ConflictResolution => self.handle_conflicts(&issue).await?,
            WorkflowStage::ReadyForTest => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::Docs => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::PullRequest => self.handle_passthrough(&issue, stage).await?,
            WorkflowStage::Complete => self.handle_complete(&issue).await?,
            WorkflowStage::Error => self.handle_error(&issue).await?,
        };

        Ok(StageOutcome { stage, advanced_to })
    }

    /// Intake: derive the requirement specification from the issue body and
    /// post it, then hand off to planning.
    async fn handle_intake(&self, issue: &IssueSnapshot) -> Result<Option<WorkflowStage>, EngineError> {
        self.post_progress(issue, WorkflowStage::Intake).await?;

        let scenarios = derive_scenarios(&issue.title, &issue.body);
        let spec_comment = render_specification_comment(issue.number, &scenarios);
        self.forge.create_comment(issue.number, &spec_comment).await?;
        info!(
            issue = issue.number,
            scenarios = scenarios.len(),
            "specification posted"
        );

        self.transition(issue, WorkflowStage::Intake, WorkflowStage::Planning)
            .await?;
        Ok(Some(WorkflowStage::Planning))
    }

    /// Stages with no engine-side work of their own: the handler records
    /// progress and advances the label so downstream tooling (and humans)
    /// pick the issue up at the next stage.
    async fn handle_passthrough(
        &self,
        issue: &IssueSnapshot,
        stage: WorkflowStage,
    ) -> Result<Option<WorkflowStage>, EngineError> {
        self.post_progress(issue, stage).await?;
        let Some(next) = stage.next() else {
            return Ok(None);
        };
        self.transition(issue, stage, next).await?;
        Ok(Some(next))
    }

    /// Audit: evaluate the gate and either advance to ready-for-test or
    /// mark the failure and stay put.
    async fn handle_audit(&self, issue: &IssueSnapshot) -> Result<Option<WorkflowStage>, EngineError> {
        self.post_progress(issue, WorkflowStage::Audit).await?;

        let verdict = self.evaluator.evaluate(issue.number).await?;
        self.forge
            .create_comment(issue.number, &verdict.render_comment())
            .await?;

        self.apply_audit_verdict(issue, &verdict).await
    }

    /// Apply a computed verdict to the issue's labels. Split out from
    /// `handle_audit` so a caller that already holds a verdict (the CLI
    /// audit command) can apply it without re-evaluating.
    pub async fn apply_audit_verdict(
        &self,
        issue: &IssueSnapshot,
        verdict: &AuditVerdict,
    ) -> Result<Option<WorkflowStage>, EngineError> {
        let labels = &self.config.labels;
        if verdict.passed {
            // A stale failure marker from an earlier pass is cleared.
            self.forge
                .remove_label(issue.number, &labels.audit_failed)
                .await?;
            self.transition(issue, WorkflowStage::Audit, WorkflowStage::ReadyForTest)
                .await?;
            Ok(Some(WorkflowStage::ReadyForTest))
        } else {
            warn!(issue = issue.number, "audit gate failed");
            self.forge
                .add_labels(issue.number, &[labels.audit_failed.clone()])
                .await?;
            Ok(None)
        }
    }

    /// Conflict resolution: attempt the automated rebase; advance only when
    /// it succeeded. The resolver applies its own outcome labels.
    async fn handle_conflicts(
        &self,
        issue: &IssueSnapshot,
    ) -> Result<Option<WorkflowStage>, EngineError> {
        self.post_progress(issue, WorkflowStage::ConflictResolution)
            .await?;

        let result = self.resolver.resolve_conflicts(issue.number).await?;
        if result.success {
            self.transition(
                issue,
                WorkflowStage::ConflictResolution,
                WorkflowStage::ReadyForTest,
            )
            .await?;
            Ok(Some(WorkflowStage::ReadyForTest))
        } else {
            Ok(None)
        }
    }

    /// Terminal stage: record the pass, move nothing.
    async fn handle_complete(
        &self,
        issue: &IssueSnapshot,
    ) -> Result<Option<WorkflowStage>, EngineError> {
        self.forge
            .create_comment(
                issue.number,
                &sign_comment(&format!(
                    "Issue #{} is complete; no further stages.",
                    issue.number
                )),
            )
            .await?;
        Ok(None)
    }

    /// No recognized stage label: leave an audit-trail comment and touch
    /// nothing else.
    async fn handle_error(&self, issue: &IssueSnapshot) -> Result<Option<WorkflowStage>, EngineError> {
        warn!(issue = issue.number, "no recognized stage label");
        self.forge
            .create_comment(
                issue.number,
                &sign_comment(
                    "No recognized workflow stage label on this issue; \
                     apply a stage label to put it back on the pipeline.",
                ),
            )
            .await?;
        Ok(None)
    }

    async fn post_progress(
        &self,
        issue: &IssueSnapshot,
        stage: WorkflowStage,
    ) -> Result<(), EngineError> {
        self.forge
            .create_comment(
                issue.number,
                &sign_comment(&format!(
                    "Processing stage `{}` for issue #{}.",
                    stage, issue.number
                )),
            )
            .await?;
        Ok(())
    }

    /// Move the stage label: add the next label first, then remove the
    /// current one, then leave the transition marker comment. If the
    /// process dies between the two label calls the issue carries both
    /// labels and the priority matcher settles it next pass.
    async fn transition(
        &self,
        issue: &IssueSnapshot,
        from: WorkflowStage,
        to: WorkflowStage,
    ) -> Result<(), EngineError> {
        let labels = &self.config.labels;
        if let Some(to_label) = to.label(labels) {
            self.forge
                .add_labels(issue.number, &[to_label.to_string()])
                .await?;
        }
        if let Some(from_label) = from.label(labels) {
            self.forge.remove_label(issue.number, from_label).await?;
        }
        self.forge
            .create_comment(issue.number, &render_transition_comment(from, to))
            .await?;
        info!(issue = issue.number, from = %from, to = %to, "stage advanced");
        Ok(())
    }

    /// Reconstruct the stage history from the transition marker comments,
    /// oldest first.
    pub async fn stage_history(
        &self,
        issue_number: u64,
    ) -> Result<Vec<TransitionRecord>, EngineError> {
        let comments = self.forge.list_comments(issue_number).await?;
        Ok(comments
            .iter()
            .filter_map(|c| parse_transition_comment(&c.body))
            .collect())
    }
}

fn render_transition_comment(from: WorkflowStage, to: WorkflowStage) -> String {
    format!(
        "{} {} {}->{} -->\nStage advanced from `{}` to `{}`.",
        TRANSITION_MARKER,
        Utc::now().to_rfc3339(),
        from,
        to,
        from,
        to
    )
}

fn parse_transition_comment(body: &str) -> Option<TransitionRecord> {
    let caps = TRANSITION_REGEX.captures(body)?;
    let from = caps[2].parse().ok()?;
    let to = caps[3].parse().ok()?;
    Some(TransitionRecord {
        timestamp: caps[1].to_string(),
        from,
        to,
    })
}
