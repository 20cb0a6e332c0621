//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "streakkeeper-cli", "--"])
        .args(args)
        .env("STREAKKEEPER_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed: {:?}\n{}", args, stderr);
    stdout
}

#[test]
fn test_status_without_activity_is_zero() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(dir.path(), &["streak", "status", "--as-of", "2024-09-05"]);
    assert_eq!(out.trim(), "0");

    let out = run_cli_success(dir.path(), &["streak", "last"]);
    assert_eq!(out.trim(), "never");
}

#[test]
fn test_record_and_lapse() {
    let dir = TempDir::new().unwrap();
    for day in ["2024-09-01T09:00:00+03:00", "2024-09-02T09:00:00+03:00", "2024-09-03T09:00:00+03:00"] {
        run_cli_success(dir.path(), &["streak", "record", "--at", day]);
    }

    let out = run_cli_success(
        dir.path(),
        &["streak", "status", "--as-of", "2024-09-03T21:00:00+03:00"],
    );
    assert_eq!(out.trim(), "3");

    let out = run_cli_success(
        dir.path(),
        &["streak", "status", "--json", "--as-of", "2024-09-05T09:00:00+03:00"],
    );
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["current_streak"], 0);
    assert_eq!(report["status"], "lapsed");

    let out = run_cli_success(dir.path(), &["streak", "show"]);
    let state: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(state["currentStreak"], 0);
    assert_eq!(state["lastVisitDate"], "2024-09-03T09:00:00+03:00");
}

#[test]
fn test_record_same_day_twice() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["streak", "record", "--at", "2024-09-01T09:00:00+03:00"]);
    let out = run_cli_success(
        dir.path(),
        &["streak", "record", "--json", "--at", "2024-09-01T20:00:00+03:00"],
    );
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["outcome"], "already_recorded");
    assert_eq!(report["changed"], false);
    assert_eq!(report["current_streak"], 1);

    let out = run_cli_success(
        dir.path(),
        &["streak", "record", "--at", "2024-09-02T08:00:00+03:00"],
    );
    assert_eq!(out.trim(), "extended: streak 2");
    let out = run_cli_success(
        dir.path(),
        &["streak", "record", "--at", "2024-09-02T21:00:00+03:00"],
    );
    assert_eq!(out.trim(), "already recorded today");
}

#[test]
fn test_days_lists_running_streak() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["streak", "record", "--at", "2024-09-01T09:00:00+03:00"]);
    run_cli_success(dir.path(), &["streak", "record", "--at", "2024-09-02T09:00:00+03:00"]);
    let out = run_cli_success(
        dir.path(),
        &["streak", "days", "--as-of", "2024-09-02T22:00:00+03:00"],
    );
    let days: Vec<&str> = out.lines().collect();
    assert_eq!(days, vec!["2024-09-01", "2024-09-02"]);
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(dir.path(), &["config", "get", "streak.backfill_policy"]);
    assert_eq!(out.trim(), "ignore");

    run_cli_success(dir.path(), &["config", "set", "streak.backfill_policy", "restart"]);
    let out = run_cli_success(dir.path(), &["config", "get", "streak.backfill_policy"]);
    assert_eq!(out.trim(), "restart");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "streak.backfill_policy", "rewind"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "streak.unknown"]);
    assert_ne!(code, 0);
}

#[test]
fn test_invalid_date_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["streak", "record", "--at", "someday"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid date"));
}

#[test]
fn test_debug_logging_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "streakkeeper-cli", "--"])
        .args(["streak", "status", "--as-of", "2024-09-05"])
        .env("STREAKKEEPER_DATA_DIR", dir.path())
        .env("RUST_LOG", "debug")
        .output()
        .expect("Failed to execute CLI command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("streak store ready"), "{stderr}");
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(dir.path(), &["completions", "bash"]);
    assert!(out.contains("streakkeeper"));
}
