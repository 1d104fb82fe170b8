//! Black-box tests of the postery binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a config that keeps snapshots inside `dir`
fn config_in(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    let snapshots = dir.join("data");
    fs::write(
        &path,
        format!("[storage]\nsnapshot_dir = {:?}\n", snapshots.display().to_string()),
    )
    .unwrap();
    path
}

fn postery(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("postery").unwrap();
    cmd.arg("--no-color").arg("--config").arg(config);
    cmd
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("postery")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn demo_streams_notifications() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());

    postery(&config)
        .args(["demo", "--replies", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello from bob!"))
        .stdout(predicate::str::contains("reply to #1"))
        .stdout(predicate::str::contains("refused:"))
        .stdout(predicate::str::contains("3 comments, 3 delivered, 0 dropped"));
}

#[test]
fn saved_demo_can_be_inspected() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());

    postery(&config)
        .args(["demo", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved snapshot"));

    postery(&config)
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to postery"))
        .stdout(predicate::str::contains("Thanks, alice! (2)"));

    postery(&config)
        .args(["snapshot", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"commentCount\": 4"));
}

#[test]
fn inspect_without_snapshots_fails() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());

    postery(&config)
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No snapshots found"));
}

#[test]
fn config_init_then_validate() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("postery.toml");

    postery(&config).args(["config", "init"]).assert().success();
    assert!(config.exists());

    postery(&config)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.toml");
    fs::write(&config, "[comments]\nmax_page_size = 0\n").unwrap();

    postery(&config)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_page_size"));
}
