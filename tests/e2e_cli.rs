//! CLI end-to-end tests
//!
//! Tests for the discforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the discforge binary
#[allow(deprecated)]
fn discforge_cmd() -> Command {
    Command::cargo_bin("discforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = discforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = discforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("discforge"))
        .stdout(predicate::str::contains("backlog"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = discforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_run_help() {
    let mut cmd = discforge_cmd();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--select"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = discforge_cmd();
    cmd.arg("check-tools").assert().success().stdout(
        predicate::str::contains("makemkvcon64").and(predicate::str::contains("HandBrakeCLI")),
    );
}

#[test]
fn test_cli_validate_valid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("discforge.toml");
    fs::write(
        &config_file,
        r#"
[drive]
device = "/dev/sr1"

[encoder]
workers = 2
"#,
    )
    .unwrap();

    let mut cmd = discforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("/dev/sr1"))
        .stdout(predicate::str::contains("Workers: 2"));
}

#[test]
fn test_cli_validate_rejects_zero_workers() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("discforge.toml");
    fs::write(&config_file, "[encoder]\nworkers = 0\n").unwrap();

    let mut cmd = discforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers"));
}

#[test]
fn test_cli_validate_nonexistent_config() {
    let mut cmd = discforge_cmd();
    cmd.args(["validate", "/nonexistent/discforge.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_cli_backlog_missing_raw_dir() {
    let temp = tempdir().unwrap();
    let handbrake = temp.path().join("HandBrakeCLI");
    fs::write(&handbrake, "").unwrap();

    let config_file = temp.path().join("discforge.toml");
    fs::write(
        &config_file,
        format!(
            "[paths]\nraw_dir = {:?}\n\n[tools]\nhandbrake_path = {:?}\n",
            temp.path().join("missing-raw"),
            handbrake
        ),
    )
    .unwrap();

    let mut cmd = discforge_cmd();
    cmd.args(["--config", config_file.to_str().unwrap(), "backlog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Raw directory not found"));
}

#[test]
fn test_cli_invalid_subcommand() {
    let mut cmd = discforge_cmd();
    cmd.arg("eject").assert().failure();
}
