//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a scratch directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusloop"))
        .args(args)
        .env("HOME", home)
        .env_remove("FOCUSLOOP_ENV")
        .env_remove("FOCUSLOOP_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

/// The snapshot is always the last JSON document printed.
fn last_snapshot(stdout: &str) -> serde_json::Value {
    let start = stdout
        .rfind("{\n  \"type\": \"state_snapshot\"")
        .expect("no state snapshot in output");
    serde_json::from_str(&stdout[start..]).expect("Failed to parse JSON output")
}

#[test]
fn test_timer_status_defaults() {
    let home = tempfile::tempdir().unwrap();
    let snapshot = last_snapshot(&run_cli_success(home.path(), &["timer", "status"]));
    assert_eq!(snapshot["phase"], "work");
    assert_eq!(snapshot["remaining_seconds"], 1800);
    assert_eq!(snapshot["running"], false);
    assert_eq!(snapshot["cycle_count"], 0);
}

#[test]
fn test_timer_start_persists_across_invocations() {
    let home = tempfile::tempdir().unwrap();
    let started = run_cli_success(home.path(), &["timer", "start"]);
    assert!(started.contains("\"timer_started\""));

    let snapshot = last_snapshot(&run_cli_success(home.path(), &["timer", "status"]));
    assert_eq!(snapshot["running"], true);
    assert!(snapshot["deadline_epoch_ms"].is_u64());

    let paused = last_snapshot(&run_cli_success(home.path(), &["timer", "pause"]));
    assert_eq!(paused["running"], false);
}

#[test]
fn test_timer_skip_and_mode() {
    let home = tempfile::tempdir().unwrap();
    let skipped = last_snapshot(&run_cli_success(home.path(), &["timer", "skip"]));
    assert_eq!(skipped["phase"], "short_break");
    assert_eq!(skipped["cycle_count"], 1);

    let moded = last_snapshot(&run_cli_success(home.path(), &["timer", "mode", "long"]));
    assert_eq!(moded["phase"], "long_break");
    assert_eq!(moded["remaining_seconds"], 900);
    assert_eq!(moded["cycle_count"], 1);
}

#[test]
fn test_timer_mode_rejects_unknown_phase() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["timer", "mode", "nap"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["config", "set", "timer.work_duration", "1500"]);
    let value = run_cli_success(home.path(), &["config", "get", "timer.work_duration"]);
    assert_eq!(value.trim(), "1500");

    let snapshot = last_snapshot(&run_cli_success(home.path(), &["timer", "status"]));
    assert_eq!(snapshot["remaining_seconds"], 1500);
}

#[test]
fn test_config_rejects_invalid_duration() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "timer.work_duration", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));

    let value = run_cli_success(home.path(), &["config", "get", "timer.work_duration"]);
    assert_eq!(value.trim(), "1800");
}

#[test]
fn test_config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list_and_reset() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["config", "set", "timer.auto_start_break", "true"]);
    let listed: serde_json::Value =
        serde_json::from_str(&run_cli_success(home.path(), &["config", "list"])).unwrap();
    assert_eq!(listed["timer"]["auto_start_break"], true);

    run_cli_success(home.path(), &["config", "reset"]);
    let value = run_cli_success(home.path(), &["config", "get", "timer.auto_start_break"]);
    assert_eq!(value.trim(), "false");
}

#[test]
fn test_stats_on_fresh_profile() {
    let home = tempfile::tempdir().unwrap();
    let stats: serde_json::Value =
        serde_json::from_str(&run_cli_success(home.path(), &["stats", "show"])).unwrap();
    assert_eq!(stats["total_completed_work_phases"], 0);

    let rewards: serde_json::Value =
        serde_json::from_str(&run_cli_success(home.path(), &["stats", "rewards"])).unwrap();
    assert!(rewards["milestones"].as_array().is_some_and(|m| !m.is_empty()));
}

#[test]
fn test_skip_does_not_record_stats() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["timer", "skip"]);
    let today: serde_json::Value =
        serde_json::from_str(&run_cli_success(home.path(), &["stats", "today"])).unwrap();
    assert_eq!(today["work_phases"], 0);
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let script = run_cli_success(home.path(), &["completions", "bash"]);
    assert!(script.contains("focusloop"));
}

#[test]
fn test_config_change_while_paused_resets_remaining() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["timer", "start"]);
    run_cli_success(home.path(), &["timer", "pause"]);

    let set = run_cli_success(home.path(), &["config", "set", "timer.work_duration", "600"]);
    assert!(set.contains("\"configuration_updated\""));

    let snapshot = last_snapshot(&run_cli_success(home.path(), &["timer", "status"]));
    assert_eq!(snapshot["remaining_seconds"], 600);
    assert_eq!(snapshot["running"], false);
}

#[test]
fn test_config_change_while_running_keeps_deadline() {
    let home = tempfile::tempdir().unwrap();
    let before = last_snapshot(&run_cli_success(home.path(), &["timer", "start"]));

    run_cli_success(home.path(), &["config", "set", "timer.work_duration", "600"]);

    let after = last_snapshot(&run_cli_success(home.path(), &["timer", "status"]));
    assert_eq!(after["running"], true);
    assert_eq!(after["deadline_epoch_ms"], before["deadline_epoch_ms"]);
}

#[test]
fn test_timer_run_delivers_work_completion_to_stats_api() {
    let home = tempfile::tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/log/session")
        .match_header("authorization", "Bearer tok")
        .with_status(201)
        .expect(1)
        .create();

    let url = server.url();
    for (key, value) in [
        ("timer.work_duration", "1"),
        ("stats_api.base_url", url.as_str()),
        ("stats_api.auth_token", "tok"),
        ("stats_api.max_attempts", "1"),
        ("stats_api.enabled", "true"),
    ] {
        run_cli_success(home.path(), &["config", "set", key, value]);
    }

    let stdout = run_cli_success(home.path(), &["timer", "run"]);
    assert!(stdout.contains("\"phase_completed\""));

    let stats: serde_json::Value =
        serde_json::from_str(&run_cli_success(home.path(), &["stats", "show"])).unwrap();
    assert_eq!(stats["total_completed_work_phases"], 1);
    mock.assert();
}
