//! Conflict commands — `stagehand conflicts`.

use anyhow::Result;
use console::style;
use std::path::Path;

use stagehand::conflict::resolver::ConflictResolver;

use super::super::ConflictCommands;

pub async fn cmd_conflicts(
    project_dir: &Path,
    repo_path: &Path,
    command: ConflictCommands,
) -> Result<()> {
    let (config, forge) = super::setup(project_dir)?;
    let git = super::git_ops(repo_path, &config)?;
    let resolver = ConflictResolver::new(forge, git, config);

    match command {
        ConflictCommands::Detect { issue } => {
            let report = resolver.detect_conflicts(issue).await?;
            if report.has_conflicts {
                println!(
                    "{}: {} conflicts with the base branch",
                    style("conflicts").red().bold(),
                    resolver.branch_for_issue(issue)
                );
                for path in &report.conflicting_paths {
                    println!("  - {}", path);
                }
            } else {
                println!(
                    "{}: {} merges cleanly",
                    style("clean").green().bold(),
                    resolver.branch_for_issue(issue)
                );
            }
        }
        ConflictCommands::Resolve { issue } => {
            let result = resolver.resolve_conflicts(issue).await?;
            if result.success {
                println!("{}", style("resolved").green().bold());
                for path in &result.resolved_paths {
                    println!("  - {}", path);
                }
            } else {
                println!(
                    "{}: {}",
                    style("manual resolution needed").yellow().bold(),
                    result.error.as_deref().unwrap_or("unresolved conflicts")
                );
            }
        }
        ConflictCommands::Status { issue } => {
            let report = resolver.track_merge_status(issue).await?;
            println!(
                "status comment posted ({} conflicting paths)",
                report.conflicting_paths.len()
            );
        }
    }

    Ok(())
}
