//! Integration tests for headless mode.

use super::common::{run_headless, Workspace};

#[test]
fn test_headless_basic_execution() {
    let ws = Workspace::new();
    let (code, stdout, stderr) = run_headless(&ws, Some("sk-test"), &["--events", "key:ctrl+c"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("Events: 1 executed"));
    assert!(ws.db_file().exists(), "--init-sample should create the database");
}

#[test]
fn test_headless_first_screen() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &[
            "--events",
            "assert:contains:Chat with SQL DB,assert:contains:How can I help you today?,assert:turns=1",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 3 passed, 0 failed"));
    assert!(stdout.contains("Ask anything from the database..."));
}

#[test]
fn test_headless_missing_key_warning() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        None,
        &[
            "--events",
            "type:How many students are there?,key:enter,assert:contains:Please add the OpenAI API key,assert:turns=1",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 2 passed, 0 failed"));
    assert!(stdout.contains("Notice (warning): Please add the OpenAI API key"));
}

#[test]
fn test_headless_question_is_answered() {
    let ws = Workspace::new();
    let (code, stdout, stderr) = run_headless(
        &ws,
        Some("sk-test"),
        &[
            "--events",
            "type:How many students are there?,key:enter,assert:turns=3,assert:contains:There are 5 records in the STUDENT table.",
            "--output",
            "json",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(json["assertions"]["passed"], 2);
    assert_eq!(json["state"]["turn_count"], 3);
    assert_eq!(json["state"]["input_text"], "");
    assert!(json["notice"].is_null());
    assert_eq!(json["transcript"][1]["role"], "user");
    assert_eq!(json["transcript"][1]["content"], "How many students are there?");
    assert_eq!(
        json["transcript"][2]["content"],
        "There are 5 records in the STUDENT table."
    );
}

#[test]
fn test_headless_clear_history() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &[
            "--events",
            "type:How many students are there?,key:enter,assert:turns=3,key:ctrl+l,assert:turns=1,assert:not-contains:There are 5 records",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 3 passed, 0 failed"));
}

#[test]
fn test_headless_incomplete_remote_settings() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &[
            "--mode",
            "remote",
            "-U",
            "reader",
            "--events",
            "assert:contains:Please provide all MySQL connection details.,assert:state:mode=remote,assert:contains:MySQL Host",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 3 passed, 0 failed"));
}

#[test]
fn test_headless_switching_mode_from_sidebar() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &[
            "--events",
            "focus:mode,key:right,assert:state:mode=remote,assert:contains:MySQL Host,key:left,assert:state:mode=embedded,assert:not-contains:MySQL Host",
        ],
    );

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 4 passed, 0 failed"));
}

#[test]
fn test_headless_assertion_failure_sets_exit_code() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &["--events", "type:hello,assert:contains:goodbye", "--output", "json"],
    );

    assert_eq!(code, 1, "Should exit with code 1 on assertion failure");
    assert!(stdout.contains(r#""passed": 0"#));
    assert!(stdout.contains(r#""failed": 1"#));
}

#[test]
fn test_headless_custom_size() {
    let ws = Workspace::new();
    let (code, stdout, _) = run_headless(
        &ws,
        Some("sk-test"),
        &["--events", "key:ctrl+c", "--size", "120x40", "--output", "json"],
    );

    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON output");
    let lines = json["screen_lines"].as_array().unwrap();
    assert!(lines.len() <= 40);
}

#[test]
fn test_headless_invalid_event_fails() {
    let ws = Workspace::new();
    let (code, _, stderr) = run_headless(&ws, Some("sk-test"), &["--events", "jump:high"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown event type"));
}
