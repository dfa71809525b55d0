use serde::Serialize;

use crate::core::errors::SyncError;
use crate::core::models::sync_operation::OperationKind;
use crate::core::models::vcs_report::{RebaseStatus, RefUpdate};

/// Payload attached to a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub operation: OperationKind,
    pub commands_run: usize,
    pub commit_skipped: bool,
    pub rebase_status: Option<RebaseStatus>,
    pub ref_updates: Vec<RefUpdate>,
}

/// Terminal result of one `SyncExecutor::execute` call.
#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// The user abandoned authentication. Not an error.
    Cancelled,
    Failed {
        operation: OperationKind,
        error: SyncError,
        /// Message of the innermost failure after unwrapping transport layers.
        root_cause: String,
    },
}

/// Exit code reported when the user cancels (SIGINT convention).
pub const EXIT_CANCELLED: i32 = 130;

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SyncOutcome::Completed(_) => 0,
            SyncOutcome::Cancelled => EXIT_CANCELLED,
            SyncOutcome::Failed { .. } => 1,
        }
    }

    /// A rejected push leaves local commits the remote does not have. The
    /// caller must stop treating the local store as published; the commits
    /// themselves are kept.
    pub fn rollback_requested(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Failed {
                error: SyncError::Push(_),
                ..
            }
        )
    }
}
