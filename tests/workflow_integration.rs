//! End-to-end workflow runs against the in-memory forge and a scripted git
//! backend: full pipeline walks, label invariants, and failure recovery.

use std::sync::Arc;

use chrono::Utc;
use stagehand::config::WorkflowConfig;
use stagehand::conflict::fake::ScriptedGit;
use stagehand::forge::fake::InMemoryForge;
use stagehand::forge::{CheckRun, IssueState, PullRequest, PullRequestFile};
use stagehand::stage::engine::StageEngine;
use stagehand::stage::scenario::SPEC_COMMENT_MARKER;
use stagehand::stage::{stage_from_labels, WorkflowStage, STAGE_PRIORITY};

const CONFLICT_SIMULATION: &str = "\
CONFLICT (content): Merge conflict in src/auth.rs
<<<<<<< main
a
=======
b
>>>>>>> feature
";

fn engine(
    forge: Arc<InMemoryForge>,
    git: ScriptedGit,
) -> StageEngine<InMemoryForge, ScriptedGit> {
    StageEngine::new(forge, Arc::new(git), Arc::new(WorkflowConfig::default()))
}

fn seed_green_pr(forge: &InMemoryForge, issue: u64) {
    forge.seed_pull_request(PullRequest {
        number: 500,
        title: "implementation".to_string(),
        body: format!("Closes #{}", issue),
        state: IssueState::Open,
        head_ref: "stagehand/issue-1".to_string(),
        base_ref: "main".to_string(),
        requested_reviewers: vec!["alice".to_string()],
    });
    forge.seed_pr_files(
        500,
        vec![
            PullRequestFile {
                path: "src/login.rs".to_string(),
                additions: 40,
                deletions: 5,
            },
            PullRequestFile {
                path: "tests/login_test.rs".to_string(),
                additions: 55,
                deletions: 0,
            },
        ],
    );
    for name in ["lint", "typecheck", "unit tests"] {
        forge.seed_check_run(
            "stagehand/issue-1",
            CheckRun {
                name: name.to_string(),
                conclusion: Some("success".to_string()),
                completed_at: Some(Utc::now()),
            },
        );
    }
}

fn stage_labels(forge: &InMemoryForge, issue: u64) -> Vec<String> {
    let config = WorkflowConfig::default();
    forge
        .labels_of(issue)
        .into_iter()
        .filter(|l| {
            STAGE_PRIORITY
                .iter()
                .any(|s| s.label(&config.labels) == Some(l.as_str()))
        })
        .collect()
}

#[tokio::test]
async fn full_pipeline_walk_reaches_complete() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(
        1,
        "Login flow",
        "## Acceptance Criteria\n- User can log in\n- User can log out",
        &["workflow:intake"],
    );
    seed_green_pr(&forge, 1);
    let eng = engine(forge.clone(), ScriptedGit::clean());

    let mut visited = Vec::new();
    for _ in 0..12 {
        let outcome = eng.process_issue(1).await.unwrap();
        visited.push(outcome.stage);
        // After every completed pass exactly one stage label remains.
        assert_eq!(
            stage_labels(&forge, 1).len(),
            1,
            "after {:?}",
            outcome.stage
        );
        if outcome.advanced_to.is_none() {
            break;
        }
    }

    assert_eq!(
        visited,
        vec![
            WorkflowStage::Intake,
            WorkflowStage::Planning,
            WorkflowStage::QaSpec,
            WorkflowStage::Implementation,
            WorkflowStage::Audit,
            WorkflowStage::ReadyForTest,
            WorkflowStage::Docs,
            WorkflowStage::PullRequest,
            WorkflowStage::Complete,
        ]
    );
    assert_eq!(stage_labels(&forge, 1), vec!["workflow:complete"]);

    // The specification comment posted at intake is what made the audit
    // verifiable.
    let comments = forge.comments_of(1);
    assert!(comments.iter().any(|c| c.contains(SPEC_COMMENT_MARKER)));
    assert!(comments.iter().any(|c| c.contains("## Audit passed")));
}

#[tokio::test]
async fn audit_gate_holds_issue_until_criteria_met() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(
        2,
        "Feature",
        "## Acceptance Criteria\n- Works",
        &["workflow:audit"],
    );
    forge.seed_comment(
        2,
        "stagehand",
        &format!("{}\nScenario: it works", SPEC_COMMENT_MARKER),
    );
    let eng = engine(forge.clone(), ScriptedGit::clean());

    // No PR yet: held at audit with the failure marker.
    let outcome = eng.process_issue(2).await.unwrap();
    assert_eq!(outcome.advanced_to, None);
    assert!(forge.labels_of(2).contains(&"workflow:audit-failed".to_string()));

    // A green PR shows up; the next pass advances and clears the marker.
    forge.seed_pull_request(PullRequest {
        number: 501,
        title: "impl".to_string(),
        body: "Closes #2".to_string(),
        state: IssueState::Open,
        head_ref: "head".to_string(),
        base_ref: "main".to_string(),
        requested_reviewers: vec!["alice".to_string()],
    });
    forge.seed_pr_files(
        501,
        vec![PullRequestFile {
            path: "src/f.rs".to_string(),
            additions: 20,
            deletions: 0,
        },
        PullRequestFile {
            path: "tests/f_test.rs".to_string(),
            additions: 30,
            deletions: 0,
        }],
    );
    for name in ["lint check", "typecheck", "test suite"] {
        forge.seed_check_run(
            "head",
            CheckRun {
                name: name.to_string(),
                conclusion: Some("success".to_string()),
                completed_at: Some(Utc::now()),
            },
        );
    }

    let outcome = eng.process_issue(2).await.unwrap();
    assert_eq!(outcome.advanced_to, Some(WorkflowStage::ReadyForTest));
    let labels = forge.labels_of(2);
    assert!(!labels.contains(&"workflow:audit-failed".to_string()));
    assert!(!labels.contains(&"workflow:audit".to_string()));
}

#[tokio::test]
async fn failed_resolution_never_reports_success() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(3, "t", "", &["workflow:conflicts"]);
    let mut git = ScriptedGit::new(CONFLICT_SIMULATION);
    git.rebase_clean = false;
    let eng = engine(forge.clone(), git);

    let outcome = eng.process_issue(3).await.unwrap();
    assert_eq!(outcome.advanced_to, None);

    let labels = forge.labels_of(3);
    assert!(labels.contains(&"workflow:needs-manual-resolution".to_string()));
    assert!(!labels.contains(&"workflow:conflicts-resolved".to_string()));
    let comments = forge.comments_of(3);
    assert!(comments.iter().any(|c| c.contains("Manual resolution needed")));
    assert!(!comments.iter().any(|c| c.contains("resolved automatically")));
}

#[tokio::test]
async fn successful_resolution_rejoins_pipeline() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(4, "t", "", &["workflow:conflicts"]);
    let eng = engine(forge.clone(), ScriptedGit::new(CONFLICT_SIMULATION));

    let outcome = eng.process_issue(4).await.unwrap();
    assert_eq!(outcome.advanced_to, Some(WorkflowStage::ReadyForTest));
    let labels = forge.labels_of(4);
    assert!(labels.contains(&"workflow:conflicts-resolved".to_string()));
    assert_eq!(stage_labels(&forge, 4), vec!["workflow:ready-for-test"]);
}

#[tokio::test]
async fn unrecognized_labels_leave_issue_untouched() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(5, "t", "", &["bug", "customer-report"]);
    let eng = engine(forge.clone(), ScriptedGit::clean());

    let outcome = eng.process_issue(5).await.unwrap();
    assert_eq!(outcome.stage, WorkflowStage::Error);
    assert_eq!(outcome.advanced_to, None);
    assert_eq!(forge.labels_of(5), vec!["bug", "customer-report"]);
}

#[tokio::test]
async fn crashed_transition_is_recovered_on_next_pass() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(6, "t", "", &["workflow:planning"]);
    let eng = engine(forge.clone(), ScriptedGit::clean());

    // The add succeeds, the remove dies: the issue is left wearing both
    // stage labels.
    forge.fail_operation("remove_label");
    assert!(eng.process_issue(6).await.is_err());
    let labels = forge.labels_of(6);
    assert!(labels.contains(&"workflow:planning".to_string()));
    assert!(labels.contains(&"workflow:qa-spec".to_string()));

    // The priority matcher resolves the ambiguity to the earlier stage,
    // and a clean retry converges back to a single label.
    let config = WorkflowConfig::default();
    assert_eq!(
        stage_from_labels(&forge.labels_of(6), &config.labels),
        WorkflowStage::Planning
    );

    forge.clear_failures();
    let outcome = eng.process_issue(6).await.unwrap();
    assert_eq!(outcome.stage, WorkflowStage::Planning);
    assert_eq!(outcome.advanced_to, Some(WorkflowStage::QaSpec));
    assert_eq!(stage_labels(&forge, 6), vec!["workflow:qa-spec"]);
}

#[tokio::test]
async fn transition_comments_reconstruct_history() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(7, "t", "", &["workflow:ready-for-test"]);
    let eng = engine(forge.clone(), ScriptedGit::clean());

    eng.process_issue(7).await.unwrap(); // -> docs
    eng.process_issue(7).await.unwrap(); // -> pull-request
    eng.process_issue(7).await.unwrap(); // -> complete

    let history = eng.stage_history(7).await.unwrap();
    let hops: Vec<(WorkflowStage, WorkflowStage)> =
        history.iter().map(|r| (r.from, r.to)).collect();
    assert_eq!(
        hops,
        vec![
            (WorkflowStage::ReadyForTest, WorkflowStage::Docs),
            (WorkflowStage::Docs, WorkflowStage::PullRequest),
            (WorkflowStage::PullRequest, WorkflowStage::Complete),
        ]
    );
}

#[tokio::test]
async fn engine_does_not_reprocess_completed_issues() {
    let forge = Arc::new(InMemoryForge::new());
    forge.seed_issue(8, "t", "", &["workflow:complete"]);
    let eng = engine(forge.clone(), ScriptedGit::clean());

    for _ in 0..3 {
        let outcome = eng.process_issue(8).await.unwrap();
        assert_eq!(outcome.advanced_to, None);
    }
    assert_eq!(stage_labels(&forge, 8), vec!["workflow:complete"]);
    // Only the terminal-stage trail comments accumulated; no transitions.
    assert!(eng.stage_history(8).await.unwrap().is_empty());
}
