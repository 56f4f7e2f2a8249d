// tests/exec.rs

#![cfg(unix)]

use std::time::Duration;

use serde_json::json;

use runwatch::discovery::{CommandDiscovery, Discovery};
use runwatch::engine::{ExecutionContext, OperationConfig, Orchestrator, ProgressOptions, RunHooks};
use runwatch::exec::run_shell;
use runwatch_test_utils::{PollSpy, TestArgs, capture_scope, with_timeout};

fn orchestrator(scope: &runwatch_test_utils::CaptureScope) -> Orchestrator {
    Orchestrator::new(ProgressOptions {
        interval: Duration::from_millis(50),
        ..ProgressOptions::default()
    })
    .with_facade(scope.facade.clone())
}

#[tokio::test]
async fn worker_output_is_captured_and_returned() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "echo '[1/2] pkg-a: completed'; echo '[2/2] pkg-b: completed'"),
        RunHooks::new(),
    ))
    .await;

    assert!(result.success, "{result:?}");
    assert_eq!(
        result.logs,
        vec!["[1/2] pkg-a: completed", "[2/2] pkg-b: completed"]
    );
    let data = result.data.unwrap();
    assert_eq!(data["result"]["exitCode"], json!(0));
    assert_eq!(data["result"]["dryRun"], json!(false));
    assert_eq!(
        data["result"]["stdout"],
        json!("[1/2] pkg-a: completed\n[2/2] pkg-b: completed")
    );
}

#[tokio::test]
async fn stderr_prefixes_set_the_level() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "echo 'warning: slow disk' >&2"),
        RunHooks::new(),
    ))
    .await;

    assert_eq!(result.logs, vec!["⚠️ slow disk"]);
}

#[tokio::test]
async fn invalid_utf8_line_does_not_stop_capture() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| {
            run_shell(
                config,
                "echo '[1/2] a: started'; printf 'caf\\351\\n'; echo '[2/2] b: completed'",
            )
        },
        RunHooks::new(),
    ))
    .await;

    assert!(result.success, "{result:?}");
    assert_eq!(
        result.logs,
        vec!["[1/2] a: started", "caf\u{FFFD}", "[2/2] b: completed"]
    );
    assert_eq!(
        result.data.unwrap()["result"]["stdout"],
        json!("[1/2] a: started\ncaf\u{FFFD}\n[2/2] b: completed")
    );
}

#[tokio::test]
async fn crlf_endings_are_trimmed() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "printf 'one\\r\\ntwo'"),
        RunHooks::new(),
    ))
    .await;

    assert_eq!(result.logs, vec!["one", "two"]);
}

#[tokio::test]
async fn failing_command_reports_exit_code_and_stderr() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "echo oops >&2; exit 3"),
        RunHooks::new(),
    ))
    .await;

    assert!(!result.success);
    let details = result.details.unwrap();
    assert_eq!(details.exit_code, Some(3));
    assert_eq!(details.stderr.as_deref(), Some("oops"));
    assert_eq!(details.phase.as_deref(), Some("execute"));
    assert_eq!(result.logs, vec!["oops"]);
    assert!(result.context.unwrap().contains("exited with code 3"));
}

#[tokio::test]
async fn settings_are_exported_to_the_command() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "echo \"$RUNWATCH_RELEASE_CHANNEL\""),
        RunHooks::new().with_config(|config: &mut OperationConfig, _args| {
            config.set("release-channel", "beta");
            Ok(())
        }),
    ))
    .await;

    assert_eq!(result.data.unwrap()["result"]["stdout"], json!("beta"));
}

#[tokio::test]
async fn dry_run_does_not_execute() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let marker = tmp.path().join("touched");
    let args = TestArgs::new().dry_run();
    let cmd = format!("touch {}", marker.display());

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, &cmd),
        RunHooks::new(),
    ))
    .await;

    assert!(result.success);
    assert!(!marker.exists());
    assert_eq!(result.data.unwrap()["result"]["dryRun"], json!(true));
    assert_eq!(result.logs, vec![format!("dry run: would execute `{cmd}`")]);
}

#[tokio::test]
async fn command_runs_in_the_context_directory() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("here.txt"), "x").unwrap();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()),
        |config| run_shell(config, "ls"),
        RunHooks::new(),
    ))
    .await;

    assert_eq!(result.logs, vec!["here.txt"]);
}

#[tokio::test]
async fn poll_sees_progress_from_a_slow_command() {
    let scope = capture_scope();
    let tmp = tempfile::tempdir().unwrap();
    let spy = PollSpy::new();
    let args = TestArgs::new();

    let result = with_timeout(orchestrator(&scope).run(
        &args,
        ExecutionContext::new(tmp.path()).with_poll(spy.callback()),
        |config| run_shell(config, "echo '[1/2] a: Running'; sleep 0.3; echo '[2/2] b: completed'"),
        RunHooks::new(),
    ))
    .await;

    assert!(result.success);
    let calls = spy.calls();
    assert!(
        calls.iter().any(|c| c.message == "Processing a (1/2)"),
        "{calls:?}"
    );
    let last = calls.last().unwrap();
    assert_eq!((last.progress, last.total), (2, Some(2)));
}

#[tokio::test]
async fn command_discovery_counts_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let args = TestArgs::new();

    let probe = CommandDiscovery::new("printf 'a\\n\\nb\\nc\\n'");
    let info = probe.discover(&args, tmp.path()).await.unwrap().unwrap();
    assert_eq!(info.total, 3);
    assert_eq!(info.message, "Found 3 units");

    let empty = CommandDiscovery::new("true");
    assert!(empty.discover(&args, tmp.path()).await.unwrap().is_none());

    let failing = CommandDiscovery::new("exit 2");
    assert!(failing.discover(&args, tmp.path()).await.is_err());
}
