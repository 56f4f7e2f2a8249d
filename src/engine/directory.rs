// src/engine/directory.rs

//! Scoped override of the process working directory.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Guard that switches the process working directory and switches it back.
///
/// Restoration happens through [`DirectoryScope::restore`] or, if that was
/// never called, on drop. The working directory is process-wide: two scopes
/// alive at once on different tasks will step on each other.
#[derive(Debug)]
pub struct DirectoryScope {
    original: Option<PathBuf>,
}

impl DirectoryScope {
    /// Change into `target`, remembering the current directory.
    pub fn enter(target: &Path) -> io::Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(target)?;
        debug!(from = %original.display(), to = %target.display(), "entered directory scope");
        Ok(Self {
            original: Some(original),
        })
    }

    /// A scope that changes nothing.
    pub fn unchanged() -> Self {
        Self { original: None }
    }

    /// Enter `target` if given, otherwise return an unchanged scope.
    pub fn enter_optional(target: Option<&Path>) -> io::Result<Self> {
        match target {
            Some(dir) => Self::enter(dir),
            None => Ok(Self::unchanged()),
        }
    }

    /// Directory to return to, if this scope changed anything.
    pub fn original(&self) -> Option<&Path> {
        self.original.as_deref()
    }

    /// Switch back to the original directory. Idempotent.
    pub fn restore(&mut self) -> io::Result<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };
        env::set_current_dir(&original)?;
        debug!(to = %original.display(), "restored working directory");
        Ok(())
    }
}

impl Drop for DirectoryScope {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %err, "failed to restore working directory on drop");
        }
    }
}
