// tests/result.rs

use std::io;

use anyhow::Context;
use serde_json::json;

use runwatch::engine::{OperationError, RunResult};

#[test]
fn success_result_shape() {
    let result = RunResult::success(json!({"ok": true}), "done", vec!["a".to_string()]);

    assert!(result.is_success());
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"success": true, "data": {"ok": true}, "message": "done", "logs": ["a"]})
    );
}

#[test]
fn failure_result_shape() {
    let err = OperationError::new("boom")
        .with_exit_code(1)
        .with_phase("execute")
        .with_stderr("stack trace");
    let result = RunResult::failure(&err, vec!["x".to_string()]);

    assert!(!result.is_success());
    assert_eq!(result.message, "Operation failed: boom");
    assert_eq!(
        result.context.as_deref(),
        Some("Operation failed during the execute phase; exited with code 1")
    );

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value["details"],
        json!({"stderr": "stack trace", "exitCode": 1, "phase": "execute"})
    );
    assert!(value.get("data").is_none());
    assert_eq!(value["logs"], json!(["x"]));
}

#[test]
fn recovery_steps_follow_the_error() {
    let report = OperationError::new("lint failed")
        .with_files(["src/a.rs", "src/b.rs"])
        .recoverable(true)
        .report();

    assert_eq!(report.recovery.len(), 2);
    assert!(report.recovery[0].contains("retry"));
    assert!(report.recovery[1].contains("src/a.rs, src/b.rs"));
    assert_eq!(
        report.details.files,
        Some(vec!["src/a.rs".to_string(), "src/b.rs".to_string()])
    );
}

#[test]
fn bare_error_gets_a_default_recovery_step() {
    let report = OperationError::new("nope").report();
    assert_eq!(report.context, None);
    assert_eq!(report.recovery.len(), 1);
}

#[test]
fn empty_streams_are_not_reported() {
    let report = OperationError::new("x").with_stdout("").report();
    assert_eq!(report.details.stdout, None);
}

#[test]
fn cause_chain_is_part_of_the_context() {
    let err: anyhow::Error = Err::<(), _>(io::Error::other("disk unplugged"))
        .context("writing artifact")
        .unwrap_err();
    let report = OperationError::from(err).or_phase("publish").report();

    assert_eq!(report.message, "writing artifact");
    assert_eq!(
        report.context.as_deref(),
        Some("Operation failed during the publish phase; caused by: disk unplugged")
    );
}

#[test]
fn or_phase_keeps_an_existing_phase() {
    let err = OperationError::new("x").with_phase("spawn").or_phase("config");
    assert_eq!(err.phase.as_deref(), Some("spawn"));
}
