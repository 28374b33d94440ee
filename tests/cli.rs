//! CLI smoke tests for the commands that work without forge credentials.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn stagehand() -> Command {
    Command::cargo_bin("stagehand").unwrap()
}

#[test]
fn config_init_writes_default_file() {
    let dir = tempdir().unwrap();
    stagehand()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stagehand.toml"));
    assert!(dir.path().join(".stagehand/stagehand.toml").exists());
}

#[test]
fn config_init_refuses_overwrite() {
    let dir = tempdir().unwrap();
    let base = ["--project-dir", dir.path().to_str().unwrap()];
    stagehand().args(base).args(["config", "init"]).assert().success();
    stagehand()
        .args(base)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_show_prints_defaults_without_file() {
    let dir = tempdir().unwrap();
    stagehand()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_branch = \"main\""))
        .stdout(predicate::str::contains("min_code_coverage = 80"));
}

#[test]
fn config_validate_warns_on_empty_slug() {
    let dir = tempdir().unwrap();
    stagehand()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("owner_repo"));
}

#[test]
fn process_without_configured_repo_fails_cleanly() {
    let dir = tempdir().unwrap();
    stagehand()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["process", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("owner_repo"));
}

#[test]
fn process_derives_repo_from_origin_remote() {
    let dir = tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    repo.remote("origin", "https://github.com/acme/widgets.git")
        .unwrap();
    // Getting past the repo check and failing on the bogus token proves the
    // slug came from the origin remote.
    stagehand()
        .env("GITHUB_TOKEN", "not-a-token")
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["process", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"))
        .stderr(predicate::str::contains("owner_repo").not());
}

#[test]
fn help_lists_subcommands() {
    stagehand()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("conflicts"))
        .stdout(predicate::str::contains("feedback"));
}
