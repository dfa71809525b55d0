use crate::core::errors::SyncError;
use crate::core::models::outcome::SyncReport;

/// Callbacks the executor invokes once an operation reaches a terminal state.
pub trait OperationHooks: Send + Sync {
    fn on_success(&self, _report: &SyncReport) {}

    fn on_error(&self, _error: &SyncError) {}
}

/// Hooks that do nothing.
pub struct NoHooks;

impl OperationHooks for NoHooks {}
