//! Audit gate command — `stagehand audit`.

use anyhow::Result;
use console::style;
use std::path::Path;

use stagehand::audit::evaluator::AuditEvaluator;
use stagehand::forge::ForgeClient;
use stagehand::stage::engine::StageEngine;

pub async fn cmd_audit(project_dir: &Path, repo_path: &Path, issue: u64, apply: bool) -> Result<()> {
    let (config, forge) = super::setup(project_dir)?;
    let evaluator = AuditEvaluator::new(forge.clone(), config.thresholds);

    let verdict = evaluator.evaluate(issue).await?;
    let banner = if verdict.passed {
        style("AUDIT PASSED").green().bold()
    } else {
        style("AUDIT FAILED").red().bold()
    };
    println!("{} for issue #{}", banner, issue);
    println!();
    println!(
        "  coverage estimate : {}% (min {}%)",
        verdict.criteria.code_coverage_estimate, config.thresholds.min_code_coverage
    );
    println!(
        "  reviewers         : {} (min {})",
        verdict.criteria.reviewers_assigned, config.thresholds.required_reviewers
    );
    println!(
        "  complexity        : {} (max {})",
        verdict.criteria.complexity_score, config.thresholds.max_complexity
    );
    println!(
        "  unit tests        : {}",
        if verdict.criteria.has_unit_tests { "present" } else { "missing" }
    );
    println!(
        "  checks            : lint {} / types {} / tests {}",
        mark(verdict.quality.lint_passed),
        mark(verdict.quality.types_passed),
        mark(verdict.quality.tests_passed)
    );
    if !verdict.recommendations.is_empty() {
        println!();
        println!("Remediation:");
        for rec in &verdict.recommendations {
            println!("  - {}", rec);
        }
    }

    if apply {
        let git = super::git_ops(repo_path, &config)?;
        let engine = StageEngine::new(forge.clone(), git, config);
        let snapshot = forge.get_issue(issue).await?;
        forge.create_comment(issue, &verdict.render_comment()).await?;
        engine.apply_audit_verdict(&snapshot, &verdict).await?;
        println!();
        println!("{}", style("verdict applied").bold());
    }

    Ok(())
}

fn mark(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("pass").green()
    } else {
        style("fail").red()
    }
}
