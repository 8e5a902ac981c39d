//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a temp dir so the
//! user's real preferences are never touched.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command with optional stdin and return (stdout, stderr, code).
fn run_cli(home: &TempDir, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomotimer"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("POMOTIMER_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn home() -> TempDir {
    tempfile::tempdir().expect("temp home")
}

#[test]
fn test_run_quits_immediately() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["run", "--no-sound", "--no-notify"], "q\n");
    assert_eq!(code, 0, "run failed");
    assert!(stdout.contains("Focus       25:00  sessions: 0  (paused)"), "{stdout}");
    assert!(stdout.contains("Stopped in Focus at 25:00 (0 focus sessions completed)"));
}

#[test]
fn test_run_applies_commands_in_order() {
    let home = home();
    let (stdout, _, code) = run_cli(
        &home,
        &["run", "--no-sound", "--no-notify", "--focus", "3"],
        "set short 2\nshort\nset long 0\nq\n",
    );
    assert_eq!(code, 0, "run failed");
    assert!(stdout.contains("Stopped in Short Break at 02:00"), "{stdout}");
}

#[test]
fn test_run_reports_unknown_input() {
    let home = home();
    let (_, stderr, code) = run_cli(&home, &["run", "--no-sound", "--no-notify"], "nap\nq\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("unknown command: nap"));
}

#[test]
fn test_run_json_final_state() {
    let home = home();
    let (stdout, _, code) = run_cli(
        &home,
        &["run", "--no-sound", "--no-notify", "--json"],
        "s\nq\n",
    );
    assert_eq!(code, 0);
    let last_line = stdout.lines().last().expect("final state line");
    let state: serde_json::Value = serde_json::from_str(last_line).unwrap();
    assert_eq!(state["mode"], "focus");
    assert_eq!(state["is_running"], true);
    assert_eq!(state["completed_focus_sessions"], 0);
}

#[test]
fn test_run_rejects_zero_minutes_flag() {
    let home = home();
    let (_, _, code) = run_cli(&home, &["run", "--focus", "0"], "");
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_then_get() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["config", "set", "durations.focus_minutes", "40"], "");
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(&home, &["config", "get", "durations.focus_minutes"], "");
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "40");

    let (stdout, _, _) = run_cli(&home, &["run", "--no-sound", "--no-notify"], "q\n");
    assert!(stdout.contains("Stopped in Focus at 40:00"), "{stdout}");
}

#[test]
fn test_config_rejects_bad_values() {
    let home = home();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "durations.focus_minutes", "0"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(&home, &["config", "get", "alerts.volume"], "");
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_is_json() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["config", "list"], "");
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["durations"]["short_break_minutes"], 5);
    assert_eq!(json["alerts"]["sound"], true);
}

#[test]
fn test_completions() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["completions", "bash"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("pomotimer"));
}
