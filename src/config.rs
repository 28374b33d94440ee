//! Configuration for the stagehand workflow engine.
//!
//! Reads `.stagehand/stagehand.toml` from the project directory. All sections
//! have sensible defaults so an empty (or absent) file is valid.
//!
//! # Configuration File Format
//!
//! ```toml
//! [repo]
//! owner_repo = "acme/widgets"
//! base_branch = "main"
//! branch_prefix = "stagehand"
//!
//! [thresholds]
//! min_code_coverage = 80
//! required_reviewers = 1
//! max_complexity = 50
//!
//! [labels]
//! intake = "workflow:intake"
//! planning = "workflow:planning"
//!
//! [[teams]]
//! name = "backend"
//! areas = ["api", "database", "auth"]
//!
//! [[teams]]
//! name = "frontend"
//! areas = ["ui", "css", "rendering"]
//! ```
//!
//! The forge token is never stored in the file; it comes from the
//! `GITHUB_TOKEN` environment variable (a `.env` file is honored).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Repository addressing and branch conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// `owner/repo` slug the forge client addresses.
    #[serde(default)]
    pub owner_repo: String,
    /// Integration base branch for conflict detection.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Prefix for feature branches; branch for issue N is
    /// `{branch_prefix}/issue-{N}`.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_branch_prefix() -> String {
    "stagehand".to_string()
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            owner_repo: String::new(),
            base_branch: default_base_branch(),
            branch_prefix: default_branch_prefix(),
        }
    }
}

/// Audit gate thresholds. The evaluator treats these as opaque inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Minimum estimated code coverage percentage.
    #[serde(default = "default_min_code_coverage")]
    pub min_code_coverage: u32,
    /// Minimum number of requested reviewers on the pull request.
    #[serde(default = "default_required_reviewers")]
    pub required_reviewers: u32,
    /// Maximum allowed complexity score.
    #[serde(default = "default_max_complexity")]
    pub max_complexity: u32,
}

fn default_min_code_coverage() -> u32 {
    80
}

fn default_required_reviewers() -> u32 {
    1
}

fn default_max_complexity() -> u32 {
    50
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            min_code_coverage: default_min_code_coverage(),
            required_reviewers: default_required_reviewers(),
            max_complexity: default_max_complexity(),
        }
    }
}

/// Label names for each workflow stage, plus the outcome labels the engine
/// applies without treating them as stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageLabels {
    #[serde(default = "default_intake")]
    pub intake: String,
    #[serde(default = "default_planning")]
    pub planning: String,
    #[serde(default = "default_qa_spec")]
    pub qa_spec: String,
    #[serde(default = "default_implementation")]
    pub implementation: String,
    #[serde(default = "default_audit")]
    pub audit: String,
    #[serde(default = "default_conflict_resolution")]
    pub conflict_resolution: String,
    #[serde(default = "default_ready_for_test")]
    pub ready_for_test: String,
    #[serde(default = "default_docs")]
    pub docs: String,
    #[serde(default = "default_pull_request")]
    pub pull_request: String,
    #[serde(default = "default_complete")]
    pub complete: String,
    /// Outcome label applied when the audit gate fails.
    #[serde(default = "default_audit_failed")]
    pub audit_failed: String,
    /// Outcome label applied after successful automated conflict resolution.
    #[serde(default = "default_conflicts_resolved")]
    pub conflicts_resolved: String,
    /// Outcome label applied when automated resolution did not succeed.
    #[serde(default = "default_needs_manual_resolution")]
    pub needs_manual_resolution: String,
}

fn default_intake() -> String {
    "workflow:intake".to_string()
}
fn default_planning() -> String {
    "workflow:planning".to_string()
}
fn default_qa_spec() -> String {
    "workflow:qa-spec".to_string()
}
fn default_implementation() -> String {
    "workflow:implementation".to_string()
}
fn default_audit() -> String {
    "workflow:audit".to_string()
}
fn default_conflict_resolution() -> String {
    "workflow:conflicts".to_string()
}
fn default_ready_for_test() -> String {
    "workflow:ready-for-test".to_string()
}
fn default_docs() -> String {
    "workflow:docs".to_string()
}
fn default_pull_request() -> String {
    "workflow:pull-request".to_string()
}
fn default_complete() -> String {
    "workflow:complete".to_string()
}
fn default_audit_failed() -> String {
    "workflow:audit-failed".to_string()
}
fn default_conflicts_resolved() -> String {
    "workflow:conflicts-resolved".to_string()
}
fn default_needs_manual_resolution() -> String {
    "workflow:needs-manual-resolution".to_string()
}

impl Default for StageLabels {
    fn default() -> Self {
        Self {
            intake: default_intake(),
            planning: default_planning(),
            qa_spec: default_qa_spec(),
            implementation: default_implementation(),
            audit: default_audit(),
            conflict_resolution: default_conflict_resolution(),
            ready_for_test: default_ready_for_test(),
            docs: default_docs(),
            pull_request: default_pull_request(),
            complete: default_complete(),
            audit_failed: default_audit_failed(),
            conflicts_resolved: default_conflicts_resolved(),
            needs_manual_resolution: default_needs_manual_resolution(),
        }
    }
}

/// A team and the content areas that route feedback to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default)]
    pub areas: Vec<String>,
}

/// Full workflow configuration, read once per invocation and immutable after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub labels: StageLabels,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

/// Relative path of the config file inside a project directory.
pub const CONFIG_PATH: &str = ".stagehand/stagehand.toml";

impl WorkflowConfig {
    /// Load configuration from a specific TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: WorkflowConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;
        Ok(config)
    }

    /// Load `.stagehand/stagehand.toml` from a project directory, falling
    /// back to defaults when the file does not exist.
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_PATH);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write a default config file, creating the `.stagehand` directory.
    /// Refuses to overwrite an existing file.
    pub fn init(project_dir: &Path) -> Result<std::path::PathBuf> {
        let path = project_dir.join(CONFIG_PATH);
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Validate the configuration and return human-readable warnings.
    /// Warnings never prevent the engine from running.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.repo.owner_repo.is_empty() {
            warnings.push("repo.owner_repo is empty; forge API calls will fail".to_string());
        } else if self.repo.owner_repo.split('/').count() != 2 {
            warnings.push(format!(
                "repo.owner_repo '{}' does not look like 'owner/repo'",
                self.repo.owner_repo
            ));
        }
        if self.thresholds.min_code_coverage > 100 {
            warnings.push(format!(
                "thresholds.min_code_coverage {} exceeds 100 and can never be met",
                self.thresholds.min_code_coverage
            ));
        }
        if self.thresholds.max_complexity == 0 {
            warnings.push(
                "thresholds.max_complexity is 0; every non-empty change will fail audit"
                    .to_string(),
            );
        }
        for team in &self.teams {
            if team.areas.is_empty() {
                warnings.push(format!(
                    "team '{}' has no areas and will never receive routed feedback",
                    team.name
                ));
            }
        }
        warnings
    }

    /// Read the forge token from the environment. A `.env` file in the
    /// working directory is honored (loaded by the caller via dotenvy).
    pub fn forge_token() -> Result<String> {
        std::env::var("GITHUB_TOKEN")
            .context("GITHUB_TOKEN is not set; export it or add it to .env")
    }
}
