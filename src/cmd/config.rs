//! Configuration view and validation commands — `stagehand config`.

use anyhow::Result;
use console::style;
use std::path::Path;

use stagehand::config::{CONFIG_PATH, WorkflowConfig};

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = project_dir.join(CONFIG_PATH);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Stagehand Configuration");
            println!("=======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("Config file: (none, using defaults)");
            }
            println!();

            let config = WorkflowConfig::load_or_default(project_dir)?;
            println!("[repo]");
            println!("  owner_repo = \"{}\"", config.repo.owner_repo);
            println!("  base_branch = \"{}\"", config.repo.base_branch);
            println!("  branch_prefix = \"{}\"", config.repo.branch_prefix);
            println!();
            println!("[thresholds]");
            println!("  min_code_coverage = {}", config.thresholds.min_code_coverage);
            println!("  required_reviewers = {}", config.thresholds.required_reviewers);
            println!("  max_complexity = {}", config.thresholds.max_complexity);
            println!();
            println!("[labels]");
            println!("  intake = \"{}\"", config.labels.intake);
            println!("  audit = \"{}\"", config.labels.audit);
            println!("  complete = \"{}\"", config.labels.complete);
            println!("  (run `config validate` for the full set)");
            if !config.teams.is_empty() {
                println!();
                for team in &config.teams {
                    println!("[[teams]]");
                    println!("  name = \"{}\"", team.name);
                    println!("  areas = {:?}", team.areas);
                }
            }
        }
        Some(ConfigCommands::Validate) => {
            let config = WorkflowConfig::load_or_default(project_dir)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("{} configuration is valid", style("ok").green().bold());
            } else {
                for warning in &warnings {
                    println!("{} {}", style("warning:").yellow().bold(), warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            let path = WorkflowConfig::init(project_dir)?;
            println!(
                "{} wrote {}",
                style("created").green().bold(),
                path.display()
            );
        }
    }

    Ok(())
}
