//! Specification scenarios derived from issue bodies.
//!
//! At intake, the first "Acceptance Criteria" section of the issue body is
//! segmented out by heading, and each bullet becomes one scenario rendered
//! with a fixed Given/When/Then template. The rendered scenarios are posted
//! as a single marker-tagged comment; later stages detect "specification
//! present" by searching for the marker rather than any structured storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Marker embedded in the specification comment so later stages can find it
/// by substring search.
pub const SPEC_COMMENT_MARKER: &str = "<!-- stagehand:specification -->";

/// Prefix of each requirement line inside the specification comment.
pub const SCENARIO_PREFIX: &str = "Scenario:";

static ACCEPTANCE_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#{1,6}\s*acceptance criteria\s*$").unwrap());

static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());

/// One extracted requirement. Ordering is insertion order from the source
/// text; scenarios are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationScenario {
    pub text: String,
}

impl SpecificationScenario {
    /// Render a criterion with the fixed Given/When/Then template. The
    /// criterion text appears verbatim in the Then clause.
    pub fn from_criterion(criterion: &str) -> Self {
        Self {
            text: format!(
                "Given the prerequisites are in place, when the change is exercised, then {}",
                criterion.trim()
            ),
        }
    }

    /// The single generic scenario synthesized when an issue body has no
    /// acceptance-criteria section.
    pub fn generic(issue_title: &str) -> Self {
        Self {
            text: format!(
                "Given the prerequisites are in place, when the change is exercised, \
                 then the behavior described in \"{}\" is observed",
                issue_title.trim()
            ),
        }
    }

    pub fn render_line(&self) -> String {
        format!("{} {}", SCENARIO_PREFIX, self.text)
    }
}

/// Extract the bullet lines of the first "Acceptance Criteria" section.
/// The section ends at the next heading of any level.
pub fn extract_acceptance_criteria(body: &str) -> Vec<String> {
    let mut criteria = Vec::new();
    let mut in_section = false;

    for line in body.lines() {
        if ACCEPTANCE_HEADING_REGEX.is_match(line.trim_end()) {
            if in_section {
                break;
            }
            in_section = true;
            continue;
        }
        if in_section {
            if HEADING_REGEX.is_match(line) {
                break;
            }
            let trimmed = line.trim();
            if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                let item = item.trim();
                if !item.is_empty() {
                    criteria.push(item.to_string());
                }
            }
        }
    }

    criteria
}

/// Derive scenarios for an issue: one per acceptance-criteria bullet, or
/// exactly one generic scenario when the section is absent.
pub fn derive_scenarios(issue_title: &str, issue_body: &str) -> Vec<SpecificationScenario> {
    let criteria = extract_acceptance_criteria(issue_body);
    if criteria.is_empty() {
        vec![SpecificationScenario::generic(issue_title)]
    } else {
        criteria
            .iter()
            .map(|c| SpecificationScenario::from_criterion(c))
            .collect()
    }
}

/// Render the specification comment body posted at intake.
pub fn render_specification_comment(
    issue_number: u64,
    scenarios: &[SpecificationScenario],
) -> String {
    let mut body = String::new();
    body.push_str(SPEC_COMMENT_MARKER);
    body.push_str("\n## Requirement Specification\n\n");
    body.push_str(&format!(
        "Derived from issue #{} acceptance criteria.\n\n",
        issue_number
    ));
    for scenario in scenarios {
        body.push_str(&scenario.render_line());
        body.push('\n');
    }
    body
}

/// Parse every `Scenario:`-prefixed line out of a specification comment.
pub fn parse_scenarios(comment_body: &str) -> Vec<String> {
    comment_body
        .lines()
        .filter_map(|line| line.trim().strip_prefix(SCENARIO_PREFIX))
        .map(|rest| rest.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_criteria_basic() {
        let body = "## Acceptance Criteria\n- User can log in\n- User can log out";
        let criteria = extract_acceptance_criteria(body);
        assert_eq!(criteria, vec!["User can log in", "User can log out"]);
    }

    #[test]
    fn test_extract_criteria_stops_at_next_heading() {
        let body = "## Acceptance Criteria\n- First\n## Notes\n- Not a criterion";
        let criteria = extract_acceptance_criteria(body);
        assert_eq!(criteria, vec!["First"]);
    }

    #[test]
    fn test_extract_criteria_first_section_only() {
        let body = "\
## Acceptance Criteria
- One

## Background

## Acceptance Criteria
- Two";
        let criteria = extract_acceptance_criteria(body);
        assert_eq!(criteria, vec!["One"]);
    }

    #[test]
    fn test_extract_criteria_case_insensitive_heading() {
        let body = "### acceptance criteria\n* Star bullets work";
        let criteria = extract_acceptance_criteria(body);
        assert_eq!(criteria, vec!["Star bullets work"]);
    }

    #[test]
    fn test_extract_criteria_ignores_non_bullet_lines() {
        let body = "## Acceptance Criteria\nSome prose here.\n- Real criterion\n\n- Another";
        let criteria = extract_acceptance_criteria(body);
        assert_eq!(criteria, vec!["Real criterion", "Another"]);
    }

    #[test]
    fn test_extract_criteria_absent_section() {
        let body = "Just a description with no headings.";
        assert!(extract_acceptance_criteria(body).is_empty());
    }

    #[test]
    fn test_derive_scenarios_embeds_criterion_verbatim_in_then_clause() {
        let body = "## Acceptance Criteria\n- User can log in\n- User can log out";
        let scenarios = derive_scenarios("Login flow", body);
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios[0].text.ends_with("then User can log in"));
        assert!(scenarios[1].text.ends_with("then User can log out"));
    }

    #[test]
    fn test_derive_scenarios_synthesizes_exactly_one_generic() {
        let scenarios = derive_scenarios("Login flow", "No criteria here.");
        assert_eq!(scenarios.len(), 1);
        assert!(scenarios[0].text.contains("Login flow"));
    }

    #[test]
    fn test_scenarios_are_not_deduplicated() {
        let body = "## Acceptance Criteria\n- Same\n- Same";
        let scenarios = derive_scenarios("t", body);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0], scenarios[1]);
    }

    #[test]
    fn test_render_comment_contains_marker_and_lines() {
        let scenarios = derive_scenarios("t", "## Acceptance Criteria\n- A\n- B");
        let comment = render_specification_comment(42, &scenarios);
        assert!(comment.contains(SPEC_COMMENT_MARKER));
        assert!(comment.contains("#42"));
        assert_eq!(comment.matches(SCENARIO_PREFIX).count(), 2);
    }

    #[test]
    fn test_parse_scenarios_round_trip() {
        let scenarios = derive_scenarios("t", "## Acceptance Criteria\n- A\n- B");
        let comment = render_specification_comment(1, &scenarios);
        let parsed = parse_scenarios(&comment);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], scenarios[0].text);
        assert_eq!(parsed[1], scenarios[1].text);
    }

    #[test]
    fn test_parse_scenarios_ignores_unrelated_lines() {
        let body = "Header\nScenario: do the thing\nNot a scenario\nScenario:\n";
        let parsed = parse_scenarios(body);
        // The empty Scenario: line is skipped
        assert_eq!(parsed, vec!["do the thing"]);
    }
}
