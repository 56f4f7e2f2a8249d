use std::path::{Path, PathBuf};

use runwatch::engine::RunArgs;

/// Minimal run arguments for driving the orchestrator in tests.
#[derive(Debug, Clone, Default)]
pub struct TestArgs {
    pub directory: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    /// Free-form label so hooks can tell argument sets apart.
    pub label: String,
}

impl TestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn labelled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}

impl RunArgs for TestArgs {
    fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn debug(&self) -> bool {
        self.debug
    }
}
