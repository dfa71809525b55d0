use std::sync::Arc;

use crate::core::errors::{PullError, PushError, SyncError, TransportError};
use crate::core::models::credential::Credential;
use crate::core::models::outcome::{SyncOutcome, SyncReport};
use crate::core::models::sync_operation::{SyncOperation, VcsCommand};
use crate::core::models::vcs_report::{RebaseStatus, RefUpdate, RefUpdateStatus};
use crate::core::traits::vcs::Vcs;

/// Ref-update message that marks a server-side fast-forward rejection.
const REMOTE_NON_FAST_FORWARD: &str = "non-fast-forward";

/// Accumulated state handed from one step to the next.
#[derive(Debug, Default)]
struct PipelineState {
    /// Pending entries seen by the last status step; `None` until one ran.
    changes: Option<usize>,
    /// Most recent failure. Never cleared by a later success.
    result: Option<SyncError>,
    /// Set when a failure makes the remaining steps meaningless.
    halted: bool,
    commands_run: usize,
    commit_skipped: bool,
    rebase_status: Option<RebaseStatus>,
    ref_updates: Vec<RefUpdate>,
}

impl PipelineState {
    fn fail(&mut self, error: SyncError) {
        tracing::warn!(error = %error, "command failed");
        self.result = Some(error);
    }
}

/// Runs the steps of a `SyncOperation` in order against a `Vcs`.
///
/// Each command is dispatched to the blocking pool and awaited before
/// the next one starts. Failures are folded into the pipeline state, so
/// `execute` always yields exactly one `SyncOutcome`.
pub struct SyncExecutor<V> {
    vcs: Arc<V>,
}

impl<V> Clone for SyncExecutor<V> {
    fn clone(&self) -> Self {
        Self {
            vcs: Arc::clone(&self.vcs),
        }
    }
}

impl<V: Vcs> SyncExecutor<V> {
    pub fn new(vcs: V) -> Self {
        Self { vcs: Arc::new(vcs) }
    }

    pub async fn execute(&self, operation: &SyncOperation, credential: Credential) -> SyncOutcome {
        let credential = Arc::new(credential);
        tracing::info!(
            operation = %operation.kind(),
            steps = operation.steps().len(),
            "executing"
        );

        let mut state = PipelineState::default();
        for command in operation.steps() {
            if state.halted {
                tracing::debug!(command = command.name(), "skipped after halt");
                continue;
            }
            state = self.step(state, command, &credential).await;
        }

        self.post_execute(operation, state)
    }

    async fn step(
        &self,
        mut state: PipelineState,
        command: &VcsCommand,
        credential: &Arc<Credential>,
    ) -> PipelineState {
        let name = command.name();
        match command {
            VcsCommand::Status => match self.dispatch(name, credential, |vcs, _| vcs.status()).await {
                Ok(report) => state.changes = Some(report.pending()),
                Err(e) => state.fail(e),
            },

            VcsCommand::Commit { message } => {
                if state.changes == Some(0) {
                    tracing::debug!("nothing to commit");
                    state.commit_skipped = true;
                    return state;
                }
                let message = message.clone();
                if let Err(e) = self
                    .dispatch(name, credential, move |vcs, _| vcs.commit(&message))
                    .await
                {
                    state.fail(e);
                }
            }

            VcsCommand::Pull { remote } => {
                let remote = remote.clone();
                match self
                    .dispatch(name, credential, move |vcs, cred| vcs.pull(&remote, cred))
                    .await
                {
                    Ok(report) => {
                        state.rebase_status = Some(report.rebase_status);
                        if report.rebase_status == RebaseStatus::Stopped {
                            state.fail(PullError::RebaseFailed.into());
                            state.halted = true;
                        }
                    }
                    Err(e) => state.fail(e),
                }
            }

            VcsCommand::Push {
                remote,
                branch,
                force,
            } => {
                let (remote, branch, force) = (remote.clone(), branch.clone(), *force);
                match self
                    .dispatch(name, credential, move |vcs, cred| {
                        vcs.push(&remote, branch.as_deref(), force, cred)
                    })
                    .await
                {
                    Ok(updates) => {
                        for update in &updates {
                            if let Some(error) = classify_ref_update(update) {
                                state.fail(error.into());
                            }
                        }
                        state.ref_updates.extend(updates);
                    }
                    Err(e) => state.fail(e),
                }
            }

            VcsCommand::Generic(generic) => {
                let generic = generic.clone();
                if let Err(e) = self
                    .dispatch(name, credential, move |vcs, cred| vcs.run(&generic, cred))
                    .await
                {
                    state.fail(e);
                }
            }
        }

        state.commands_run += 1;
        state
    }

    /// Run one blocking `Vcs` call on the blocking pool.
    async fn dispatch<T, F>(
        &self,
        command: &'static str,
        credential: &Arc<Credential>,
        call: F,
    ) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&V, &Credential) -> Result<T, TransportError> + Send + 'static,
    {
        let vcs = Arc::clone(&self.vcs);
        let credential = Arc::clone(credential);
        tracing::debug!(command, "running");

        match tokio::task::spawn_blocking(move || call(&vcs, &credential)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(SyncError::Command { command, source }),
            Err(join) => Err(SyncError::Task {
                detail: join.to_string(),
            }),
        }
    }

    fn post_execute(&self, operation: &SyncOperation, state: PipelineState) -> SyncOutcome {
        let kind = operation.kind();
        match state.result {
            None => {
                let report = SyncReport {
                    operation: kind,
                    commands_run: state.commands_run,
                    commit_skipped: state.commit_skipped,
                    rebase_status: state.rebase_status,
                    ref_updates: state.ref_updates,
                };
                tracing::info!(operation = %kind, commands = report.commands_run, "completed");
                operation.hooks().on_success(&report);
                SyncOutcome::Completed(report)
            }
            Some(error) if error.is_user_cancelled() => {
                tracing::info!(operation = %kind, "cancelled by user");
                SyncOutcome::Cancelled
            }
            Some(error) => {
                let root_cause = error.root_cause().to_string();
                tracing::error!(operation = %kind, error = %error, %root_cause, "operation failed");
                operation.hooks().on_error(&error);
                SyncOutcome::Failed {
                    operation: kind,
                    error,
                    root_cause,
                }
            }
        }
    }
}

/// Map one remote ref update to a push failure, if it is one.
pub fn classify_ref_update(update: &RefUpdate) -> Option<PushError> {
    match update.status {
        RefUpdateStatus::Ok | RefUpdateStatus::UpToDate => None,
        RefUpdateStatus::RejectedNonfastforward => Some(PushError::NonFastForward),
        RefUpdateStatus::RejectedOtherReason => Some(match update.message.as_deref() {
            Some(REMOTE_NON_FAST_FORWARD) => PushError::RemoteRejected,
            Some(message) => PushError::Generic(message.to_string()),
            None => PushError::Generic(update.status.name().to_string()),
        }),
        RefUpdateStatus::RejectedNodelete
        | RefUpdateStatus::RejectedRemoteChanged
        | RefUpdateStatus::NonExisting
        | RefUpdateStatus::NotAttempted => Some(PushError::Generic(update.status.name().to_string())),
    }
}
