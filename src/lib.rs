// src/lib.rs

pub mod capture;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notify;
pub mod progress;

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, ReportMode};
use crate::config::{ConfigFile, load_or_default};
use crate::discovery::{CommandDiscovery, Discovery, StaticDiscovery};
use crate::engine::{ExecutionContext, OperationConfig, Orchestrator, RunHooks, RunResult};
use crate::exec::run_shell;
use crate::notify::{JsonLinesTransport, PollCallback};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the notification sink chosen by `--mode`
/// - discovery (`--total`, `--discover` or `[discovery]`)
/// - the orchestrator wrapping the shell command
pub async fn run(args: CliArgs) -> Result<RunResult> {
    let cfg = load_or_default(args.config.as_deref())?;

    let command = args.command_line();
    if command.trim().is_empty() {
        bail!("no command given; pass it after `--`");
    }

    let context = execution_context(&args)?;
    let discovery = select_discovery(&args, &cfg);
    let settings = args.settings.clone();

    let mut hooks = RunHooks::new().with_config(move |config: &mut OperationConfig, _args: &CliArgs| {
        for (key, value) in settings {
            config.set(key, value);
        }
        Ok(())
    });
    if let Some(probe) = discovery.as_deref() {
        hooks = hooks.with_discovery(probe);
    }

    let orchestrator = Orchestrator::new(cfg.progress_options());
    info!(command = %command, mode = ?args.mode, "wrapping command");

    let result = orchestrator
        .run(&args, context, |config| run_shell(config, &command), hooks)
        .await;

    debug!(success = result.success, lines = result.logs.len(), "run complete");
    Ok(result)
}

/// Print the effective configuration for `--print-config`.
pub fn print_config(args: &CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let options = cfg.progress_options();

    println!("runwatch configuration");
    println!("  progress.interval = {:?}", options.interval);
    println!("  progress.fallback_message = {}", options.fallback_message);
    println!("  progress.completion_message = {}", options.completion_message);
    println!("  progress.placeholder_log = {}", options.placeholder_log);
    println!("  capture.level = {}", options.capture.min_level);

    match (&cfg.discovery.total, &cfg.discovery.command) {
        (Some(total), _) => println!("  discovery.total = {total}"),
        (_, Some(command)) => println!("  discovery.command = {command}"),
        _ => println!("  discovery = none"),
    }
    if let Some(message) = &cfg.discovery.message {
        println!("  discovery.message = {message}");
    }

    Ok(())
}

fn execution_context(args: &CliArgs) -> Result<ExecutionContext> {
    let context = ExecutionContext::current()?;
    let context = match args.mode {
        ReportMode::Push => {
            let Some(token) = args.token.clone() else {
                bail!("--mode push requires --token");
            };
            context.with_push(token, Arc::new(JsonLinesTransport::stdout()))
        }
        ReportMode::Poll => context.with_poll(PollCallback::stderr_printer()),
        ReportMode::Silent => context,
    };
    Ok(context)
}

/// CLI flags win over the config file.
fn select_discovery(args: &CliArgs, cfg: &ConfigFile) -> Option<Box<dyn Discovery<CliArgs>>> {
    if let Some(total) = args.total {
        return Some(Box::new(StaticDiscovery::new(total, None)));
    }
    if let Some(command) = &args.discover {
        return Some(Box::new(CommandDiscovery::new(command.clone())));
    }
    if let Some(fixed) = cfg.static_discovery() {
        return Some(Box::new(fixed));
    }
    cfg.command_discovery()
        .map(|probe| Box::new(probe) as Box<dyn Discovery<CliArgs>>)
}
