// src/engine/context.rs

//! Inputs of a run: caller context, operation config and hooks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::discovery::Discovery;
use crate::notify::{PollCallback, PushChannel, PushTransport, ProgressToken};

/// What the orchestrator needs to know about caller arguments.
///
/// Everything else in the argument type is opaque and only handed back to
/// hooks and discovery.
pub trait RunArgs {
    /// Directory the operation should run in, relative to the context's
    /// working directory when not absolute.
    fn directory(&self) -> Option<&Path> {
        None
    }

    fn dry_run(&self) -> bool {
        false
    }

    fn verbose(&self) -> bool {
        false
    }

    fn debug(&self) -> bool {
        false
    }
}

/// Caller-supplied context for one run. Read-only for the orchestrator.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub working_directory: PathBuf,
    pub push: Option<PushChannel>,
    pub poll: Option<PollCallback>,
}

impl ExecutionContext {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            push: None,
            poll: None,
        }
    }

    /// Context rooted at the process's current directory.
    pub fn current() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn with_push(
        mut self,
        token: impl Into<ProgressToken>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        self.push = Some(PushChannel::new(token, transport));
        self
    }

    pub fn with_poll(mut self, callback: PollCallback) -> Self {
        self.poll = Some(callback);
        self
    }

    /// Resolve the directory an operation runs in.
    pub fn resolve_directory(&self, requested: Option<&Path>) -> PathBuf {
        match requested {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.working_directory.join(dir),
            None => self.working_directory.clone(),
        }
    }
}

/// Configuration object handed to the operation.
///
/// Assembled from the run arguments, then optionally customised by the
/// caller's config hook before the operation starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationConfig {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    /// Free-form, operation-specific settings.
    pub settings: Map<String, Value>,
}

impl OperationConfig {
    pub fn from_args<A: RunArgs + ?Sized>(args: &A, directory: PathBuf) -> Self {
        Self {
            directory,
            dry_run: args.dry_run(),
            verbose: args.verbose(),
            debug: args.debug(),
            settings: Map::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }
}

/// Synchronous config customisation, run right before the operation.
pub type ConfigHook<'a, A> =
    Box<dyn FnOnce(&mut OperationConfig, &A) -> anyhow::Result<()> + Send + 'a>;

/// Turns the raw operation result into result data.
///
/// Receives the raw result, the run arguments and the directory the process
/// was in before the run.
pub type ResultHook<'a, A, T> = Box<dyn FnOnce(T, &A, &Path) -> Value + Send + 'a>;

/// Optional collaborators of a run.
pub struct RunHooks<'a, A, T> {
    pub config: Option<ConfigHook<'a, A>>,
    pub result: Option<ResultHook<'a, A, T>>,
    pub discovery: Option<&'a dyn Discovery<A>>,
}

impl<A, T> Default for RunHooks<'_, A, T> {
    fn default() -> Self {
        Self {
            config: None,
            result: None,
            discovery: None,
        }
    }
}

impl<'a, A, T> RunHooks<'a, A, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut OperationConfig, &A) -> anyhow::Result<()> + Send + 'a,
    {
        self.config = Some(Box::new(hook));
        self
    }

    pub fn with_result<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(T, &A, &Path) -> Value + Send + 'a,
    {
        self.result = Some(Box::new(hook));
        self
    }

    pub fn with_discovery(mut self, discovery: &'a dyn Discovery<A>) -> Self {
        self.discovery = Some(discovery);
        self
    }
}
