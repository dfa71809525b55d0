use std::path::PathBuf;

use crate::core::traits::hooks::{NoHooks, OperationHooks};

/// A single typed repository command.
///
/// Each variant carries exactly what the executor needs to run it and to
/// interpret its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCommand {
    Status,
    Commit {
        message: String,
    },
    /// Fetch then rebase the current branch onto its upstream.
    Pull {
        remote: String,
    },
    /// Push `branch` (the current branch when `None`).
    Push {
        remote: String,
        branch: Option<String>,
        force: bool,
    },
    Generic(GenericCommand),
}

impl VcsCommand {
    pub fn name(&self) -> &'static str {
        match self {
            VcsCommand::Status => "status",
            VcsCommand::Commit { .. } => "commit",
            VcsCommand::Pull { .. } => "pull",
            VcsCommand::Push { .. } => "push",
            VcsCommand::Generic(command) => command.name(),
        }
    }
}

/// Commands without special result handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericCommand {
    /// Stage every change, including deletions.
    AddAll,
    Fetch {
        remote: String,
    },
    ResetHard {
        target: String,
    },
    Clone {
        url: String,
        work_tree: PathBuf,
    },
    /// Create a branch at HEAD without checking it out.
    CreateBranch {
        name: String,
    },
    /// Abort an in-progress rebase; no-op when none is running.
    RebaseAbort,
}

impl GenericCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GenericCommand::AddAll => "add",
            GenericCommand::Fetch { .. } => "fetch",
            GenericCommand::ResetHard { .. } => "reset",
            GenericCommand::Clone { .. } => "clone",
            GenericCommand::CreateBranch { .. } => "branch",
            GenericCommand::RebaseAbort => "rebase --abort",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Clone,
    Pull,
    Push,
    Sync,
    ResetToRemote,
    BreakOutOfDetached,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            OperationKind::Clone => "clone",
            OperationKind::Pull => "pull",
            OperationKind::Push => "push",
            OperationKind::Sync => "sync",
            OperationKind::ResetToRemote => "reset to remote",
            OperationKind::BreakOutOfDetached => "break out of detached state",
        };
        f.write_str(text)
    }
}

/// An ordered, fixed sequence of commands plus terminal hooks.
pub struct SyncOperation {
    kind: OperationKind,
    steps: Vec<VcsCommand>,
    hooks: Box<dyn OperationHooks>,
}

impl SyncOperation {
    pub fn new(kind: OperationKind, steps: Vec<VcsCommand>) -> Self {
        Self {
            kind,
            steps,
            hooks: Box::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl OperationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Clone `url` into `work_tree`. The caller attaches cleanup hooks.
    pub fn clone_repo(url: impl Into<String>, work_tree: impl Into<PathBuf>) -> Self {
        Self::new(
            OperationKind::Clone,
            vec![VcsCommand::Generic(GenericCommand::Clone {
                url: url.into(),
                work_tree: work_tree.into(),
            })],
        )
    }

    pub fn pull(remote: &str) -> Self {
        Self::new(
            OperationKind::Pull,
            vec![VcsCommand::Pull {
                remote: remote.to_string(),
            }],
        )
    }

    pub fn push(remote: &str) -> Self {
        Self::new(
            OperationKind::Push,
            vec![VcsCommand::Push {
                remote: remote.to_string(),
                branch: None,
                force: false,
            }],
        )
    }

    /// Stage, commit when something changed, rebase on the remote, push.
    pub fn sync(remote: &str, message: &str) -> Self {
        Self::new(
            OperationKind::Sync,
            vec![
                VcsCommand::Generic(GenericCommand::AddAll),
                VcsCommand::Status,
                VcsCommand::Commit {
                    message: message.to_string(),
                },
                VcsCommand::Pull {
                    remote: remote.to_string(),
                },
                VcsCommand::Push {
                    remote: remote.to_string(),
                    branch: None,
                    force: false,
                },
            ],
        )
    }

    /// Throw away local state and match `remote/branch`.
    pub fn reset_to_remote(remote: &str, branch: &str) -> Self {
        Self::new(
            OperationKind::ResetToRemote,
            vec![
                VcsCommand::Generic(GenericCommand::AddAll),
                VcsCommand::Generic(GenericCommand::Fetch {
                    remote: remote.to_string(),
                }),
                VcsCommand::Generic(GenericCommand::ResetHard {
                    target: format!("{remote}/{branch}"),
                }),
            ],
        )
    }

    /// Abort a stuck rebase and save the restored local branch to
    /// `side_branch` on the remote.
    ///
    /// The abort comes first: mid-rebase HEAD is the upstream tip plus the
    /// commits replayed so far, not the local work.
    pub fn break_out_of_detached(remote: &str, side_branch: &str) -> Self {
        Self::new(
            OperationKind::BreakOutOfDetached,
            vec![
                VcsCommand::Generic(GenericCommand::RebaseAbort),
                VcsCommand::Generic(GenericCommand::CreateBranch {
                    name: side_branch.to_string(),
                }),
                VcsCommand::Push {
                    remote: remote.to_string(),
                    branch: Some(side_branch.to_string()),
                    force: false,
                },
            ],
        )
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn steps(&self) -> &[VcsCommand] {
        &self.steps
    }

    pub fn hooks(&self) -> &dyn OperationHooks {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOperation")
            .field("kind", &self.kind)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
