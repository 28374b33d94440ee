//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module      | Commands handled |
//! |-------------|------------------|
//! | `process`   | `Process`        |
//! | `audit`     | `Audit`          |
//! | `conflicts` | `Conflicts`      |
//! | `feedback`  | `Feedback`       |
//! | `config`    | `Config`         |

pub mod audit;
pub mod config;
pub mod conflicts;
pub mod feedback;
pub mod process;

pub use audit::cmd_audit;
pub use config::cmd_config;
pub use conflicts::cmd_conflicts;
pub use feedback::cmd_feedback;
pub use process::cmd_process;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use stagehand::config::WorkflowConfig;
use stagehand::conflict::git::LocalGitOps;
use stagehand::forge::github::{self, GithubForge};

/// Load config and build the authenticated forge client. When the config
/// does not name the repository, the `origin` remote of the surrounding git
/// repository is used instead.
pub(crate) fn setup(project_dir: &Path) -> Result<(Arc<WorkflowConfig>, Arc<GithubForge>)> {
    let mut config = WorkflowConfig::load_or_default(project_dir)?;
    if config.repo.owner_repo.is_empty() {
        config.repo.owner_repo = origin_owner_repo(project_dir).ok_or_else(|| {
            anyhow::anyhow!(
                "repo.owner_repo is not configured and no GitHub `origin` remote was found; \
                 run `stagehand config init` and edit {}",
                stagehand::config::CONFIG_PATH
            )
        })?;
    }
    let token = WorkflowConfig::forge_token()?;
    if !github::is_valid_token(&token) {
        anyhow::bail!("GITHUB_TOKEN does not look like a GitHub token");
    }
    let forge = GithubForge::new(token, config.repo.owner_repo.clone());
    Ok((Arc::new(config), Arc::new(forge)))
}

/// `owner/repo` slug from the `origin` remote of the repository containing
/// `project_dir`, when there is one and it points at GitHub.
fn origin_owner_repo(project_dir: &Path) -> Option<String> {
    let repo = git2::Repository::discover(project_dir).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    github::parse_owner_repo_from_url(remote.url()?)
}

/// Local git backend for merge analysis and resolution. The remote is the
/// configured forge repository over HTTPS.
pub(crate) fn git_ops(repo_path: &Path, config: &WorkflowConfig) -> Result<Arc<LocalGitOps>> {
    let token = WorkflowConfig::forge_token().context("conflict commands need a forge token")?;
    let remote_url = format!(
        "https://x-access-token:{}@github.com/{}.git",
        token, config.repo.owner_repo
    );
    Ok(Arc::new(LocalGitOps::new(repo_path, remote_url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_origin_owner_repo_reads_remote() {
        let dir = tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        repo.remote("origin", "https://github.com/acme/widgets.git")
            .unwrap();
        assert_eq!(
            origin_owner_repo(dir.path()),
            Some("acme/widgets".to_string())
        );
    }

    #[test]
    fn test_origin_owner_repo_without_repository() {
        let dir = tempdir().unwrap();
        assert_eq!(origin_owner_repo(dir.path()), None);
    }
}
