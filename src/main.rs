use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version, about = "Label-driven delivery workflow engine")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory holding .stagehand/stagehand.toml
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Local git repository used for merge analysis (defaults to the
    /// project directory)
    #[arg(long, global = true)]
    pub repo_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process an issue: run its current stage handler and advance the label
    Process {
        /// Issue number
        issue: u64,
        /// Show the reconstructed stage history after processing
        #[arg(long)]
        history: bool,
    },
    /// Evaluate the audit gate for an issue without touching labels
    Audit {
        issue: u64,
        /// Apply the verdict (advance or mark failed) instead of only
        /// printing it
        #[arg(long)]
        apply: bool,
    },
    /// Detect, resolve, or report merge conflicts for an issue's branch
    Conflicts {
        #[command(subcommand)]
        command: ConflictCommands,
    },
    /// Collect and classify feedback comments from an issue
    Feedback {
        issue: u64,
        /// File a grouped summary issue from the collected feedback
        #[arg(long)]
        summarize: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConflictCommands {
    /// Read-only conflict check between the issue branch and the base
    Detect { issue: u64 },
    /// Attempt automated resolution by rebase
    Resolve { issue: u64 },
    /// Post the current merge status as an issue comment
    Status { issue: u64 },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default stagehand.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let repo_path = cli.repo_path.clone().unwrap_or_else(|| project_dir.clone());

    match &cli.command {
        Commands::Process { issue, history } => {
            cmd::cmd_process(&project_dir, &repo_path, *issue, *history).await?;
        }
        Commands::Audit { issue, apply } => {
            cmd::cmd_audit(&project_dir, &repo_path, *issue, *apply).await?;
        }
        Commands::Conflicts { command } => {
            cmd::cmd_conflicts(&project_dir, &repo_path, command.clone()).await?;
        }
        Commands::Feedback { issue, summarize } => {
            cmd::cmd_feedback(&project_dir, *issue, *summarize).await?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(&project_dir, command.clone())?;
        }
    }

    Ok(())
}
