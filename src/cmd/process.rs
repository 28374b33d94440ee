//! Stage processing command — `stagehand process`.

use anyhow::Result;
use console::style;
use std::path::Path;

use stagehand::stage::engine::StageEngine;

pub async fn cmd_process(
    project_dir: &Path,
    repo_path: &Path,
    issue: u64,
    history: bool,
) -> Result<()> {
    let (config, forge) = super::setup(project_dir)?;
    let git = super::git_ops(repo_path, &config)?;
    let engine = StageEngine::new(forge, git, config);

    let outcome = engine.process_issue(issue).await?;
    match outcome.advanced_to {
        Some(next) => println!(
            "{} issue #{}: {} -> {}",
            style("advanced").green().bold(),
            issue,
            outcome.stage,
            next
        ),
        None => println!(
            "{} issue #{} stays at {}",
            style("held").yellow().bold(),
            issue,
            outcome.stage
        ),
    }

    if history {
        println!();
        println!("Stage history:");
        for record in engine.stage_history(issue).await? {
            println!(
                "  {}  {} -> {}",
                style(&record.timestamp).dim(),
                record.from,
                record.to
            );
        }
    }

    Ok(())
}
