// src/engine/runtime.rs

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::capture::{CollectorHandle, LogCollector, LogFacade};
use crate::discovery::{Discovery, DiscoveryInfo};
use crate::notify::NotificationSink;
use crate::progress::discovery_line;

use super::context::{ConfigHook, ExecutionContext, OperationConfig, RunArgs, RunHooks};
use super::core::{ProgressCore, RunPhase};
use super::directory::DirectoryScope;
use super::error::OperationError;
use super::result::RunResult;
use super::timer::ProgressTimer;
use super::ProgressOptions;

/// Target of the discovery announcement line.
///
/// Must stay outside the facade's internal targets: the line has to reach
/// the captured buffer, where the extractor recognises its label.
const DISCOVERY_TARGET: &str = "runwatch::discovered";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Drives one wrapped operation at a time and reports its progress.
///
/// This is the async/IO shell around [`ProgressCore`], which contains the
/// progress and dedup semantics. This struct handles the timer, the
/// collector, the working directory and the delivery of updates.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    options: ProgressOptions,
    facade: LogFacade,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(ProgressOptions::default())
    }
}

/// Mutable bookkeeping of a run between the start of `Running` and settle.
struct ActiveRun {
    run_id: u64,
    phase: RunPhase,
    core: ProgressCore,
    sink: NotificationSink,
    collector: CollectorHandle,
    timer: ProgressTimer,
    directory: DirectoryScope,
}

impl Orchestrator {
    /// Orchestrator attached to the process-wide logging facade.
    pub fn new(options: ProgressOptions) -> Self {
        Self {
            options,
            facade: LogFacade::global().clone(),
        }
    }

    /// Capture from `facade` instead of the process-wide one.
    pub fn with_facade(mut self, facade: LogFacade) -> Self {
        self.facade = facade;
        self
    }

    pub fn options(&self) -> &ProgressOptions {
        &self.options
    }

    pub fn facade(&self) -> &LogFacade {
        &self.facade
    }

    /// Run `operation` to completion and report its progress.
    ///
    /// Never fails: every outcome, including setup and operation errors, is
    /// folded into the returned [`RunResult`].
    pub async fn run<'a, A, T, F, Fut>(
        &self,
        args: &'a A,
        context: ExecutionContext,
        operation: F,
        hooks: RunHooks<'a, A, T>,
    ) -> RunResult
    where
        A: RunArgs + Sync,
        T: Serialize,
        F: FnOnce(OperationConfig) -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        let run_id = RUN_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        let RunHooks {
            config: config_hook,
            result: result_hook,
            discovery,
        } = hooks;

        let resolved = context.resolve_directory(args.directory());
        let original = std::env::current_dir().unwrap_or_else(|_| context.working_directory.clone());
        let sink = NotificationSink::select(context.push, context.poll);
        info!(run_id, sink = sink.kind(), dir = %resolved.display(), "run starting");

        // Idle -> Discovering (optional)
        let mut phase = RunPhase::Idle;
        let discovered = match discovery {
            Some(probe) => {
                phase = advance(run_id, phase, RunPhase::Discovering);
                discover_best_effort(run_id, probe, args, &resolved).await
            }
            None => None,
        };

        // -> Running
        let phase = advance(run_id, phase, RunPhase::Running);
        let mut run = ActiveRun {
            run_id,
            phase,
            core: ProgressCore::new(discovered.as_ref(), self.options.fallback_message.clone()),
            sink,
            collector: LogCollector::install(&self.facade, self.options.capture),
            timer: ProgressTimer::start(self.options.interval),
            directory: DirectoryScope::unchanged(),
        };

        if let Some(info) = &discovered {
            info!(target: DISCOVERY_TARGET, "{}", discovery_line(info.total, &info.message));
        }

        if run.sink.is_push() {
            let initial = run.core.initial_update();
            run.sink.deliver(&initial);
        }

        let outcome = match self.prepare(&mut run, args, &resolved, config_hook) {
            Ok(config) => self.drive(&mut run, operation(config)).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(raw) => {
                let logs = self.settle(&mut run, RunPhase::Succeeded);
                self.succeed(&mut run, &logs);
                let data = match result_hook {
                    Some(shape) => shape(raw, args, &original),
                    None => default_result_data(raw, &resolved),
                };
                RunResult::success(
                    data,
                    self.options.completion_message.clone(),
                    self.logs_or_placeholder(logs),
                )
            }
            Err(err) => {
                let logs = self.settle(&mut run, RunPhase::Failed);
                self.fail(&mut run, logs, err)
            }
        }
    }

    /// Enter the directory scope and assemble the operation config.
    fn prepare<A>(
        &self,
        run: &mut ActiveRun,
        args: &A,
        resolved: &Path,
        config_hook: Option<ConfigHook<'_, A>>,
    ) -> Result<OperationConfig, OperationError>
    where
        A: RunArgs,
    {
        let target = args.directory().map(|_| resolved);
        run.directory = DirectoryScope::enter_optional(target).map_err(|err| {
            OperationError::new(format!(
                "cannot enter directory {}: {err}",
                resolved.display()
            ))
            .with_phase("setup")
            .with_cause(err)
        })?;

        let mut config = OperationConfig::from_args(args, resolved.to_path_buf());
        if let Some(hook) = config_hook {
            hook(&mut config, args).map_err(|err| OperationError::from(err).or_phase("config"))?;
        }
        debug!(run_id = run.run_id, ?config, "operation config assembled");
        Ok(config)
    }

    /// Poll the operation and the timer together until the operation settles.
    async fn drive<T, Fut>(&self, run: &mut ActiveRun, operation: Fut) -> Result<T, OperationError>
    where
        Fut: Future<Output = Result<T, OperationError>>,
    {
        tokio::pin!(operation);

        loop {
            tokio::select! {
                biased;
                outcome = &mut operation => break outcome,
                _ = run.timer.tick() => self.on_tick(run),
            }
        }
    }

    fn on_tick(&self, run: &mut ActiveRun) {
        let logs = run.collector.read();
        match run.core.tick(&logs) {
            Some(update) => {
                debug!(
                    run_id = run.run_id,
                    tick = run.core.ticks(),
                    progress = update.progress,
                    message = update.message.as_deref().unwrap_or_default(),
                    "progress changed"
                );
                run.sink.deliver(&update);
            }
            None => {
                debug!(run_id = run.run_id, tick = run.core.ticks(), "progress unchanged");
            }
        }
    }

    /// Stop the timer, restore the directory, take the final buffer and
    /// remove the collector, in that order.
    fn settle(&self, run: &mut ActiveRun, next: RunPhase) -> Vec<String> {
        run.timer.cancel();

        let original = run.directory.original().map(Path::to_path_buf);
        if let Err(err) = run.directory.restore() {
            warn!(
                run_id = run.run_id,
                error = %err,
                dir = ?original,
                "failed to restore working directory"
            );
        }

        let logs = run.collector.read();
        run.collector.teardown();
        run.phase = advance(run.run_id, run.phase, next);
        logs
    }

    /// Deliver the final update of a successful run.
    fn succeed(&self, run: &mut ActiveRun, logs: &[String]) {
        let (snapshot, update) = run
            .core
            .final_update(logs, self.options.completion_message.clone());
        info!(
            run_id = run.run_id,
            completed = snapshot.completed_count,
            progress = update.progress,
            total = ?update.total,
            lines = logs.len(),
            "run succeeded"
        );
        run.sink.deliver(&update);
    }

    fn fail(&self, run: &mut ActiveRun, logs: Vec<String>, err: OperationError) -> RunResult {
        warn!(
            run_id = run.run_id,
            error = %err,
            phase = err.phase.as_deref().unwrap_or("operation"),
            lines = logs.len(),
            "run failed"
        );
        let update = run.core.error_update(&logs, &err.message);
        run.sink.deliver(&update);

        RunResult::failure(&err, self.logs_or_placeholder(logs))
    }

    fn logs_or_placeholder(&self, logs: Vec<String>) -> Vec<String> {
        if logs.is_empty() {
            vec![self.options.placeholder_log.clone()]
        } else {
            logs
        }
    }
}

fn advance(run_id: u64, from: RunPhase, to: RunPhase) -> RunPhase {
    if !from.can_advance_to(to) {
        warn!(run_id, ?from, ?to, "unexpected run phase transition");
    }
    debug!(run_id, ?from, ?to, "run phase transition");
    to
}

async fn discover_best_effort<A>(
    run_id: u64,
    probe: &dyn Discovery<A>,
    args: &A,
    directory: &Path,
) -> Option<DiscoveryInfo> {
    match probe.discover(args, directory).await {
        Ok(Some(info)) => {
            info!(run_id, total = info.total, message = %info.message, "discovery finished");
            Some(info)
        }
        Ok(None) => {
            debug!(run_id, "discovery returned no data");
            None
        }
        Err(err) => {
            warn!(run_id, error = %err, "discovery failed; continuing without a total");
            None
        }
    }
}

/// Default result data: the raw result plus the directory it ran in.
fn default_result_data<T: Serialize>(raw: T, directory: &Path) -> Value {
    let result = serde_json::to_value(raw).unwrap_or_else(|err| {
        warn!(error = %err, "operation result is not representable as JSON");
        Value::Null
    });
    json!({
        "result": result,
        "directory": directory.display().to_string(),
    })
}
