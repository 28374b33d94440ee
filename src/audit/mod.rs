//! Audit verdict types and the pass/fail derivation.
//!
//! The criteria vector is recomputed on every audit pass and never
//! persisted; a verdict lives exactly long enough to be rendered into a
//! comment. `passed` is a pure function of the criteria, the verification
//! result, and the quality checks against the configured thresholds.

pub mod evaluator;

use serde::{Deserialize, Serialize};

use crate::config::ThresholdsConfig;
use crate::forge::ENGINE_SIGNATURE;

/// The four derived quality signals computed from a pull request's diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCriteria {
    /// Estimated coverage percent, always in [0, 100]. Zero when the PR has
    /// no source files (or no PR was found at all).
    pub code_coverage_estimate: u32,
    pub reviewers_assigned: u32,
    /// Crude size proxy, not real cyclomatic complexity: total changed
    /// lines / 10, clamped to 100.
    pub complexity_score: u32,
    pub has_unit_tests: bool,
}

/// Outcome of the requirement-traceability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    pub missing_requirements: Vec<String>,
}

/// Interpreted check-run results for the PR head ref. A category with no
/// matching check run reports as failed, not as "not applicable".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityChecks {
    pub lint_passed: bool,
    pub types_passed: bool,
    pub tests_passed: bool,
}

impl QualityChecks {
    pub fn all_passed(&self) -> bool {
        self.lint_passed && self.types_passed && self.tests_passed
    }
}

/// Complete audit verdict, created fresh per invocation and rendered into a
/// comment before being discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub criteria: AuditCriteria,
    pub verification: VerificationResult,
    pub quality: QualityChecks,
    pub passed: bool,
    pub recommendations: Vec<String>,
}

impl AuditVerdict {
    /// Derive `passed` and the remediation list from the three inputs.
    /// Remediation lines come out in a fixed order: tests → coverage →
    /// reviewers → complexity → lint → types → tests-passing → missing
    /// requirements.
    pub fn derive(
        criteria: AuditCriteria,
        verification: VerificationResult,
        quality: QualityChecks,
        thresholds: &ThresholdsConfig,
    ) -> Self {
        let passed = quality.all_passed()
            && criteria.code_coverage_estimate >= thresholds.min_code_coverage
            && criteria.reviewers_assigned >= thresholds.required_reviewers
            && criteria.complexity_score <= thresholds.max_complexity
            && criteria.has_unit_tests
            && verification.success;

        let mut recommendations = Vec::new();
        if !criteria.has_unit_tests {
            recommendations.push("Add unit tests covering the changed code".to_string());
        }
        if criteria.code_coverage_estimate < thresholds.min_code_coverage {
            recommendations.push(format!(
                "Increase test coverage: estimated {}%, minimum {}%",
                criteria.code_coverage_estimate, thresholds.min_code_coverage
            ));
        }
        if criteria.reviewers_assigned < thresholds.required_reviewers {
            recommendations.push(format!(
                "Request at least {} reviewer(s): {} currently assigned",
                thresholds.required_reviewers, criteria.reviewers_assigned
            ));
        }
        if criteria.complexity_score > thresholds.max_complexity {
            recommendations.push(format!(
                "Reduce change complexity: score {}, maximum {}",
                criteria.complexity_score, thresholds.max_complexity
            ));
        }
        if !quality.lint_passed {
            recommendations.push("Fix lint check failures on the PR head".to_string());
        }
        if !quality.types_passed {
            recommendations.push("Fix type check failures on the PR head".to_string());
        }
        if !quality.tests_passed {
            recommendations.push("Fix failing test runs on the PR head".to_string());
        }
        for missing in &verification.missing_requirements {
            recommendations.push(format!("Address unverified requirement: {}", missing));
        }

        Self {
            criteria,
            verification,
            quality,
            passed,
            recommendations,
        }
    }

    /// Render the verdict as the markdown comment body the engine posts.
    /// The body carries the engine's comment signature so it is never
    /// mistaken for human feedback.
    pub fn render_comment(&self) -> String {
        let mut body = String::new();
        body.push_str(if self.passed {
            "## Audit passed\n\n"
        } else {
            "## Audit failed\n\n"
        });
        body.push_str(&format!(
            "- Coverage estimate: {}%\n- Reviewers assigned: {}\n- Complexity score: {}\n- Unit tests present: {}\n",
            self.criteria.code_coverage_estimate,
            self.criteria.reviewers_assigned,
            self.criteria.complexity_score,
            if self.criteria.has_unit_tests { "yes" } else { "no" },
        ));
        body.push_str(&format!(
            "- Checks: lint {} / types {} / tests {}\n",
            pass_fail(self.quality.lint_passed),
            pass_fail(self.quality.types_passed),
            pass_fail(self.quality.tests_passed),
        ));
        body.push_str(&format!(
            "- Requirements verified: {}\n",
            if self.verification.success { "yes" } else { "no" }
        ));
        if !self.recommendations.is_empty() {
            body.push_str("\n### Remediation\n\n");
            for rec in &self.recommendations {
                body.push_str(&format!("- {}\n", rec));
            }
        }
        body.push_str(&format!("\n{}", ENGINE_SIGNATURE));
        body
    }
}

fn pass_fail(ok: bool) -> &'static str {
    if ok { "pass" } else { "fail" }
}
