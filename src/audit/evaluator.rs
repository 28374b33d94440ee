//! Audit evaluator: computes the criteria vector, the requirement
//! verification, and the quality-check interpretation for an issue's pull
//! request.
//!
//! Absence of data is a soft failure everywhere here: no PR referencing the
//! issue yields a zero criteria vector, no specification comment yields a
//! failed verification, and a check category with no matching run reports
//! as failed. Only forge API errors propagate.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ThresholdsConfig;
use crate::errors::ForgeError;
use crate::forge::{CheckRun, ForgeClient, PullRequest, PullRequestFile};
use crate::stage::scenario::{SPEC_COMMENT_MARKER, parse_scenarios};

use super::{AuditCriteria, AuditVerdict, QualityChecks, VerificationResult};

/// File extensions counted as implementation language sources.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "py", "go", "java", "rb", "c", "cc", "cpp", "h", "hpp", "cs",
    "kt", "swift",
];

/// A changed path counts as test material when any segment mentions
/// `test` or `spec`.
fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains("test") || lower.contains("spec")
}

fn is_source_path(path: &str) -> bool {
    if is_test_path(path) {
        return false;
    }
    path.rsplit('.')
        .next()
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Evaluates audit criteria for issues against an opaque threshold set.
pub struct AuditEvaluator<F: ForgeClient> {
    forge: Arc<F>,
    thresholds: ThresholdsConfig,
}

impl<F: ForgeClient> AuditEvaluator<F> {
    pub fn new(forge: Arc<F>, thresholds: ThresholdsConfig) -> Self {
        Self { forge, thresholds }
    }

    /// Locate the open pull request referencing the issue. `None` is a soft
    /// failure, not an error.
    pub async fn find_pull_request(
        &self,
        issue_number: u64,
    ) -> Result<Option<PullRequest>, ForgeError> {
        let mut prs = self.forge.search_open_prs_referencing(issue_number).await?;
        if prs.len() > 1 {
            debug!(
                issue = issue_number,
                count = prs.len(),
                "multiple open PRs reference issue; using the first"
            );
        }
        Ok(if prs.is_empty() {
            None
        } else {
            Some(prs.remove(0))
        })
    }

    /// Compute the criteria vector for the issue's pull request. Returns a
    /// zero-valued vector when no PR references the issue.
    pub async fn evaluate_audit_criteria(
        &self,
        issue_number: u64,
    ) -> Result<AuditCriteria, ForgeError> {
        let Some(pr) = self.find_pull_request(issue_number).await? else {
            info!(issue = issue_number, "no open PR references issue; zero criteria");
            return Ok(AuditCriteria::default());
        };

        let files = self.forge.list_pull_request_files(pr.number).await?;
        Ok(criteria_from_diff(&files, pr.requested_reviewers.len() as u32))
    }

    /// Verify that the implementation plausibly covers every extracted
    /// requirement. The policy is deliberately coarse: satisfied iff the PR
    /// changes at least as many files as there are requirements.
    pub async fn verify_implementation(
        &self,
        issue_number: u64,
    ) -> Result<VerificationResult, ForgeError> {
        let comments = self.forge.list_comments(issue_number).await?;
        let spec_comment = comments
            .iter()
            .find(|c| c.body.contains(SPEC_COMMENT_MARKER));

        let Some(spec_comment) = spec_comment else {
            return Ok(VerificationResult {
                success: false,
                missing_requirements: vec!["No specification comment found".to_string()],
            });
        };

        let requirements = parse_scenarios(&spec_comment.body);
        if requirements.is_empty() {
            return Ok(VerificationResult {
                success: false,
                missing_requirements: vec![
                    "Specification comment contains no scenarios".to_string(),
                ],
            });
        }

        let Some(pr) = self.find_pull_request(issue_number).await? else {
            return Ok(VerificationResult {
                success: false,
                missing_requirements: requirements,
            });
        };

        let changed_files = self.forge.list_pull_request_files(pr.number).await?.len();
        if changed_files >= requirements.len() {
            Ok(VerificationResult {
                success: true,
                missing_requirements: vec![],
            })
        } else {
            // Report the requirements beyond the changed-file count as
            // unverified.
            Ok(VerificationResult {
                success: false,
                missing_requirements: requirements.into_iter().skip(changed_files).collect(),
            })
        }
    }

    /// Interpret the check runs on the PR head ref. Each category is passed
    /// iff its most recently completed matching run concluded `success`.
    pub async fn validate_code_quality(
        &self,
        pr: &PullRequest,
    ) -> Result<QualityChecks, ForgeError> {
        let runs = self.forge.list_check_runs(&pr.head_ref).await?;
        Ok(QualityChecks {
            lint_passed: category_passed(&runs, &["lint"]),
            types_passed: category_passed(&runs, &["type", "tsc"]),
            tests_passed: category_passed(&runs, &["test"]),
        })
    }

    /// Full evaluation: criteria + verification + quality → verdict.
    pub async fn evaluate(&self, issue_number: u64) -> Result<AuditVerdict, ForgeError> {
        let criteria = self.evaluate_audit_criteria(issue_number).await?;
        let verification = self.verify_implementation(issue_number).await?;
        let quality = match self.find_pull_request(issue_number).await? {
            Some(pr) => self.validate_code_quality(&pr).await?,
            // No PR: every quality gate reports failed.
            None => QualityChecks::default(),
        };
        let verdict = AuditVerdict::derive(criteria, verification, quality, &self.thresholds);
        info!(
            issue = issue_number,
            passed = verdict.passed,
            coverage = verdict.criteria.code_coverage_estimate,
            complexity = verdict.criteria.complexity_score,
            "audit evaluated"
        );
        Ok(verdict)
    }
}

/// Pure criteria computation from a PR diff.
pub fn criteria_from_diff(files: &[PullRequestFile], reviewers_assigned: u32) -> AuditCriteria {
    let mut source_lines: u64 = 0;
    let mut test_lines: u64 = 0;
    let mut total_lines: u64 = 0;
    let mut has_unit_tests = false;

    for file in files {
        total_lines += file.lines_changed();
        if is_test_path(&file.path) {
            test_lines += file.lines_changed();
            has_unit_tests = true;
        } else if is_source_path(&file.path) {
            source_lines += file.lines_changed();
        }
    }

    let code_coverage_estimate = if source_lines == 0 {
        0
    } else {
        let ratio = (100.0 * test_lines as f64 / source_lines as f64).round() as u64;
        ratio.min(100) as u32
    };

    let complexity_score = ((total_lines as f64 / 10.0).round() as u64).min(100) as u32;

    AuditCriteria {
        code_coverage_estimate,
        reviewers_assigned,
        complexity_score,
        has_unit_tests,
    }
}

/// A category is passed iff the most recently completed run whose name
/// contains one of the keywords concluded `success`. No matching run means
/// failed.
fn category_passed(runs: &[CheckRun], keywords: &[&str]) -> bool {
    runs.iter()
        .filter(|run| {
            let name = run.name.to_lowercase();
            keywords.iter().any(|k| name.contains(k))
        })
        .max_by_key(|run| run.completed_at)
        .map(|run| run.conclusion.as_deref() == Some("success"))
        .unwrap_or(false)
}
