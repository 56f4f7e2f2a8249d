// src/exec/command.rs

//! Shell command runner.

use std::collections::VecDeque;
use std::process::Stdio;

use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::{OperationConfig, OperationError};

use super::WORKER_TARGET;

/// How many trailing lines of each stream are kept for results and errors.
const TAIL_LINES: usize = 200;

/// Outcome of a command that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub command: String,
    pub exit_code: i32,
    pub dry_run: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Environment variable name for an operation setting.
fn setting_env_name(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("RUNWATCH_{sanitized}")
}

fn setting_env_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Forward every line of `stream` to the worker target, keeping a tail.
///
/// Lines are decoded lossily so invalid UTF-8 never stops the pump; the pipe
/// is read until EOF either way.
async fn pump_lines<R>(stream: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };

    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                info!(target: WORKER_TARGET, "{line}");
                if tail.len() == TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Err(err) => {
                debug!(error = %err, "worker stream read failed; discarding the rest");
                // Keep draining so the worker can still write.
                let _ = io::copy(&mut reader, &mut io::sink()).await;
                break;
            }
        }
    }

    tail.into_iter().collect::<Vec<_>>().join("\n")
}

/// Decode one raw line, dropping the trailing `\n` or `\r\n`.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Run `cmd` in `config.directory`, streaming its output into `tracing`.
///
/// Settings from the config are exported as `RUNWATCH_<KEY>` environment
/// variables. In dry-run mode the command is only announced.
pub async fn run_shell(config: OperationConfig, cmd: &str) -> Result<CommandOutput, OperationError> {
    if config.dry_run {
        info!(target: WORKER_TARGET, "dry run: would execute `{cmd}`");
        return Ok(CommandOutput {
            command: cmd.to_string(),
            exit_code: 0,
            dry_run: true,
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    debug!(cmd = %cmd, dir = %config.directory.display(), "starting command");

    let mut command = shell_command(cmd);
    command
        .current_dir(&config.directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &config.settings {
        command.env(setting_env_name(key), setting_env_value(value));
    }

    let mut child = command.spawn().map_err(|err| {
        OperationError::new(format!("failed to spawn `{cmd}`: {err}"))
            .with_phase("spawn")
            .with_cause(err)
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Drain both pipes while waiting so neither buffer can fill up.
    let (stdout_tail, stderr_tail, status) =
        tokio::join!(pump_lines(stdout), pump_lines(stderr), child.wait());

    let status = status.map_err(|err| {
        OperationError::new(format!("failed to wait for `{cmd}`: {err}"))
            .with_phase("execute")
            .with_stdout(stdout_tail.clone())
            .with_stderr(stderr_tail.clone())
            .with_cause(err)
    })?;

    let code = status.code().unwrap_or(-1);
    debug!(cmd = %cmd, exit_code = code, success = status.success(), "command exited");

    if !status.success() {
        return Err(OperationError::new(format!("`{cmd}` exited with code {code}"))
            .with_phase("execute")
            .with_exit_code(code)
            .with_stdout(stdout_tail)
            .with_stderr(stderr_tail));
    }

    Ok(CommandOutput {
        command: cmd.to_string(),
        exit_code: code,
        dry_run: false,
        stdout: stdout_tail,
        stderr: stderr_tail,
    })
}
