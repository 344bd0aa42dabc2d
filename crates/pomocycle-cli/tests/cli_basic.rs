//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory and
//! checks the JSON it prints.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomocycle"))
        .args(args)
        .env("POMOCYCLE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("{args:?} printed invalid JSON ({e}): {stdout}"))
}

fn event_types(output: &Value) -> Vec<String> {
    output["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_status_on_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert!(status["status"]["current"].is_null());
    assert_eq!(status["status"]["suggested_next"], "work");
    assert!(dir.path().join("pomocycle.db").exists());
}

#[test]
fn test_start_pause_resume() {
    let dir = tempfile::tempdir().unwrap();
    let started = run_json(dir.path(), &["timer", "start", "--task", "report"]);
    assert_eq!(event_types(&started), vec!["started"]);
    assert_eq!(started["status"]["current"]["task_id"], "report");
    assert_eq!(started["status"]["current"]["status"], "active");

    let paused = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(paused["status"]["timer_state"], "paused");

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let resumed = run_json(dir.path(), &["timer", "resume"]);
    assert_eq!(resumed["status"]["current"]["pause_count"], 1);
}

#[test]
fn test_work_cycle_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["config", "set", "schedule.work_duration", "30"]);

    run_json(dir.path(), &["timer", "start", "--task", "essay"]);
    let ticked = run_json(dir.path(), &["timer", "tick", "--count", "40"]);
    assert!(event_types(&ticked).contains(&"completed".to_string()));
    assert!(ticked["status"]["current"].is_null());
    assert_eq!(ticked["status"]["suggested_next"], "short_break");
    assert_eq!(ticked["status"]["cycle"]["completed_work_count"], 1);

    let skipped = run_json(dir.path(), &["timer", "skip-break"]);
    assert_eq!(event_types(&skipped), vec!["break_skipped"]);
    assert_eq!(skipped["status"]["suggested_next"], "work");

    run_json(dir.path(), &["timer", "next"]);
    let reset = run_json(dir.path(), &["timer", "reset", "--notes", "fire drill"]);
    assert_eq!(event_types(&reset), vec!["interrupted"]);

    let today = run_json(dir.path(), &["stats", "today"]);
    assert_eq!(today["completed_pomodoros"], 1);
    assert_eq!(today["interrupted"], 1);
    assert_eq!(today["focus_secs"], 30);

    let all = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(all["completion_rate"], 0.5);

    let report = run_json(dir.path(), &["stats", "report"]);
    assert_eq!(report["streak_days"], 1);
    assert_eq!(report["hourly_distribution"].as_array().unwrap().len(), 24);

    let range = run_json(dir.path(), &["stats", "range"]);
    assert_eq!(range["completed_pomodoros"], 1);
    assert_eq!(range["interrupted"], 1);
    assert_eq!(range["interruption_rate"], 0.5);
    assert_eq!(range["total_sessions"], 2);

    let empty = run_json(
        dir.path(),
        &["stats", "range", "--from", "2001-01-01", "--to", "2001-01-31"],
    );
    assert_eq!(empty["total_sessions"], 0);

    let task = run_json(dir.path(), &["stats", "task", "essay"]);
    assert_eq!(task["completed_pomodoros"], 1);
    let history = task["sessions"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["actual_duration"], 30);
}

#[test]
fn test_long_tick_run_reports_every_event() {
    let dir = tempfile::tempdir().unwrap();
    for (key, value) in [
        ("schedule.work_duration", "1"),
        ("schedule.short_break", "1"),
        ("schedule.long_break", "1"),
        ("automation.auto_start_breaks", "true"),
        ("automation.auto_start_work", "true"),
        ("automation.settle_secs", "0"),
    ] {
        run_json(dir.path(), &["config", "set", key, value]);
    }

    run_json(dir.path(), &["timer", "start"]);
    let ticked = run_json(dir.path(), &["timer", "tick", "--count", "200"]);
    let types = event_types(&ticked);
    let completed = types.iter().filter(|t| *t == "completed").count();
    let started = types.iter().filter(|t| *t == "started").count();
    assert!(completed >= 200, "only {completed} completions reported");
    assert_eq!(started, completed);

    let all = run_json(dir.path(), &["stats", "all"]);
    assert!(all["total_completed"].as_u64().unwrap() >= 100);
}

#[test]
fn test_skip_break_without_pending_break_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "skip-break"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Lifecycle error: no pending break to skip"));
}

#[test]
fn test_start_rejects_unknown_type() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "--type", "nap"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let got = run_json(dir.path(), &["config", "get", "schedule.long_break_interval"]);
    assert_eq!(got["value"], "4");

    let set = run_json(dir.path(), &["config", "set", "automation.auto_start_breaks", "true"]);
    assert_eq!(set["value"], "true");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "schedule.work_duration", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);

    let listed = run_json(dir.path(), &["config", "list"]);
    assert_eq!(listed["automation"]["auto_start_breaks"], true);

    let reset = run_json(dir.path(), &["config", "reset"]);
    assert_eq!(reset["automation"]["auto_start_breaks"], false);
    assert_eq!(reset["schedule"]["work_duration"], 1500);
}
