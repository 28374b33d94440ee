//! Feedback collection: classify issue comments and route them to teams.
//!
//! Classification is keyword-driven and deliberately simple; precedence is
//! bug over enhancement over question, so a comment reading "this feature
//! crashes" files as a bug. Comments left by the engine itself (markers,
//! progress, verdicts) are excluded from collection: they are recognized by
//! the engine's comment markers, not by author, since on a real forge they
//! arrive under whatever account the token authenticates as.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::config::WorkflowConfig;
use crate::errors::EngineError;
use crate::forge::{is_engine_comment, ForgeClient, IssueComment};

const BUG_KEYWORDS: &[&str] = &["bug", "broken", "crash", "error", "fails", "failure", "regression"];
const ENHANCEMENT_KEYWORDS: &[&str] = &["feature", "enhancement", "improve", "would be nice", "suggestion", "could we"];
const QUESTION_KEYWORDS: &[&str] = &["how do", "how does", "why does", "question", "clarify", "?"];

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["critical", "urgent", "blocker", "blocking", "security", "error", "data loss"];
const LOW_PRIORITY_KEYWORDS: &[&str] = &["nit", "minor", "typo", "style", "cosmetic"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Bug,
    Enhancement,
    Question,
    Other,
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bug => "bug",
            Self::Enhancement => "enhancement",
            Self::Question => "question",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for FeedbackPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        write!(f, "{}", s)
    }
}

/// One classified piece of feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub comment_id: u64,
    pub author: String,
    pub body: String,
    pub kind: FeedbackKind,
    pub priority: FeedbackPriority,
    /// Routed team name, when any configured team's areas match.
    pub team: Option<String>,
}

/// Classify a comment body. Kind precedence: bug > enhancement > question.
pub fn classify_kind(body: &str) -> FeedbackKind {
    let lower = body.to_lowercase();
    if BUG_KEYWORDS.iter().any(|k| lower.contains(k)) {
        FeedbackKind::Bug
    } else if ENHANCEMENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        FeedbackKind::Enhancement
    } else if QUESTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        FeedbackKind::Question
    } else {
        FeedbackKind::Other
    }
}

/// Priority from urgency keywords; medium when nothing matches.
pub fn classify_priority(body: &str) -> FeedbackPriority {
    let lower = body.to_lowercase();
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        FeedbackPriority::High
    } else if LOW_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        FeedbackPriority::Low
    } else {
        FeedbackPriority::Medium
    }
}

/// Pluggable classification strategy. The keyword matcher is the default;
/// a stronger strategy can be substituted without touching the collector.
pub trait Classifier: Send + Sync {
    fn kind(&self, body: &str) -> FeedbackKind;
    fn priority(&self, body: &str) -> FeedbackPriority;
}

/// Default keyword-based strategy.
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn kind(&self, body: &str) -> FeedbackKind {
        classify_kind(body)
    }

    fn priority(&self, body: &str) -> FeedbackPriority {
        classify_priority(body)
    }
}

/// Collects and classifies feedback comments from issues.
pub struct FeedbackClassifier<F: ForgeClient> {
    forge: Arc<F>,
    config: Arc<WorkflowConfig>,
    classifier: Box<dyn Classifier>,
}

impl<F: ForgeClient> FeedbackClassifier<F> {
    pub fn new(forge: Arc<F>, config: Arc<WorkflowConfig>) -> Self {
        Self::with_classifier(forge, config, Box::new(KeywordClassifier))
    }

    pub fn with_classifier(
        forge: Arc<F>,
        config: Arc<WorkflowConfig>,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            forge,
            config,
            classifier,
        }
    }

    /// First configured team whose areas appear in the comment text.
    pub fn route_to_team(&self, body: &str) -> Option<String> {
        let lower = body.to_lowercase();
        self.config
            .teams
            .iter()
            .find(|team| team.areas.iter().any(|area| lower.contains(&area.to_lowercase())))
            .map(|team| team.name.clone())
    }

    fn classify(&self, comment: &IssueComment) -> FeedbackItem {
        FeedbackItem {
            comment_id: comment.id,
            author: comment.author.clone(),
            body: comment.body.clone(),
            kind: self.classifier.kind(&comment.body),
            priority: self.classifier.priority(&comment.body),
            team: self.route_to_team(&comment.body),
        }
    }

    /// Collect and classify every human comment on an issue.
    pub async fn collect_feedback(
        &self,
        issue_number: u64,
    ) -> Result<Vec<FeedbackItem>, EngineError> {
        let comments = self.forge.list_comments(issue_number).await?;
        let items: Vec<FeedbackItem> = comments
            .iter()
            .filter(|c| !is_engine_comment(&c.body))
            .map(|c| self.classify(c))
            .collect();
        info!(
            issue = issue_number,
            items = items.len(),
            "feedback collected"
        );
        Ok(items)
    }

    /// File a summary issue grouping the collected feedback by kind.
    /// Returns `None` without filing anything when there is no feedback.
    pub async fn file_summary_issue(
        &self,
        issue_number: u64,
    ) -> Result<Option<u64>, EngineError> {
        let items = self.collect_feedback(issue_number).await?;
        if items.is_empty() {
            return Ok(None);
        }

        let title = format!("Feedback summary for issue #{}", issue_number);
        let body = render_summary(issue_number, &items);
        let number = self.forge.create_issue(&title, &body).await?;
        info!(
            issue = issue_number,
            summary = number,
            "feedback summary filed"
        );
        Ok(Some(number))
    }
}

fn render_summary(issue_number: u64, items: &[FeedbackItem]) -> String {
    let mut body = format!(
        "Collected from the comment thread of issue #{}.\n",
        issue_number
    );
    for kind in [
        FeedbackKind::Bug,
        FeedbackKind::Enhancement,
        FeedbackKind::Question,
        FeedbackKind::Other,
    ] {
        let of_kind: Vec<&FeedbackItem> = items.iter().filter(|i| i.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        body.push_str(&format!("\n## {}\n\n", heading(kind)));
        for item in of_kind {
            let team = item
                .team
                .as_deref()
                .map(|t| format!(", team: {}", t))
                .unwrap_or_default();
            body.push_str(&format!(
                "- ({}{}) @{}: {}\n",
                item.priority,
                team,
                item.author,
                first_line(&item.body)
            ));
        }
    }
    body
}

fn heading(kind: FeedbackKind) -> &'static str {
    match kind {
        FeedbackKind::Bug => "Bugs",
        FeedbackKind::Enhancement => "Enhancements",
        FeedbackKind::Question => "Questions",
        FeedbackKind::Other => "Other",
    }
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or("")
}
