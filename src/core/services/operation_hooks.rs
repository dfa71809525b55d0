use std::path::PathBuf;

use crate::core::errors::SyncError;
use crate::core::traits::hooks::OperationHooks;

/// Removes a partially cloned work tree when the clone fails.
#[derive(Debug, Clone)]
pub struct CloneCleanup {
    pub work_tree: PathBuf,
}

impl CloneCleanup {
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        Self {
            work_tree: work_tree.into(),
        }
    }
}

impl OperationHooks for CloneCleanup {
    fn on_error(&self, _error: &SyncError) {
        if !self.work_tree.exists() {
            return;
        }
        match std::fs::remove_dir_all(&self.work_tree) {
            Ok(()) => {
                tracing::info!(path = %self.work_tree.display(), "removed partial clone")
            }
            Err(e) => tracing::warn!(
                path = %self.work_tree.display(),
                error = %e,
                "could not remove partial clone"
            ),
        }
    }
}
