//! Integration tests for the kindling binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_app(manifest: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("requirements.txt"), manifest).unwrap();
    fs::write(temp.path().join("main.py"), "print('hello')\n").unwrap();
    temp
}

fn kindling(app: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("kindling"));
    cmd.current_dir(app)
        .env_remove("KINDLING_APP_ROOT")
        .env_remove("KINDLING_PYTHON_VERSION")
        .env("NO_COLOR", "1");
    cmd
}

fn read_log(app: &Path) -> String {
    fs::read_to_string(app.join("logger").join("logs").join("provision.log")).unwrap()
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kindling"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pinned Python runtime"))
        .stdout(predicate::str::contains("provision"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kindling"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn provision_rejects_unpinned_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("requests==2.31.0\nflask\n");

    kindling(app.path())
        .arg("provision")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("flask"))
        .stderr(predicate::str::contains("provision.log"));

    let log = read_log(app.path());
    assert!(log.contains("STATE: Preflight"));
    assert!(log.contains("ERROR [UnpinnedRequirementError]"));
    assert!(log.contains("line 2: flask"));
    assert!(!log.contains("STATE: ResolveVersion"));
    assert!(!app.path().join("venv").exists());
    Ok(())
}

#[test]
fn bare_invocation_launches_and_fails_preflight() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("numpy>=1.26\n");

    kindling(app.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Provisioning environment before launch"));

    assert!(read_log(app.path()).contains("Provisioning required"));
    Ok(())
}

#[test]
fn status_reports_failed_run_as_json() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("flask\n");
    kindling(app.path()).arg("provision").assert().code(1);

    let output = kindling(app.path())
        .args(["status", "--json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let status: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(status["ok"], false);
    assert_eq!(status["exit_code"], 1);
    assert!(status["message"]
        .as_str()
        .unwrap()
        .starts_with("UnpinnedRequirementError"));
    Ok(())
}

#[test]
fn status_without_runs() -> Result<(), Box<dyn std::error::Error>> {
    let app = TempDir::new()?;
    kindling(app.path())
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No provisioning run recorded"));
    Ok(())
}

#[test]
fn check_passes_pinned_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("# web\nflask==3.0.0\nrequests @ https://example.org/requests.whl\n");
    kindling(app.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pinned"));
    Ok(())
}

#[test]
fn check_honours_allow_unpinned() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("flask\n");
    kindling(app.path()).arg("check").assert().code(1);
    kindling(app.path())
        .args(["check", "--allow-unpinned"])
        .assert()
        .success()
        .stderr(predicate::str::contains("line 1: flask"));
    Ok(())
}

#[test]
fn unknown_config_key_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("flask==3.0.0\n");
    fs::write(app.path().join("kindling.yml"), "allow_unpinned: true\n")?;
    kindling(app.path())
        .arg("provision")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("allow_unpinned"));
    Ok(())
}

#[test]
fn app_root_flag_and_env() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("flask==3.0.0\n");
    let elsewhere = TempDir::new()?;

    kindling(elsewhere.path())
        .args(["check", "--app-root"])
        .arg(app.path())
        .assert()
        .success();
    kindling(elsewhere.path())
        .arg("check")
        .env("KINDLING_APP_ROOT", app.path())
        .assert()
        .success();
    Ok(())
}

#[test]
fn malformed_python_version_is_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let app = setup_app("flask==3.0.0\n");
    kindling(app.path())
        .args(["provision", "--python-version", "3.11"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("3.11"));
    Ok(())
}

#[test]
fn completions_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("kindling"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("kindling"));
    Ok(())
}
