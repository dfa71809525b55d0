use serde::Serialize;

/// Working-tree summary produced by a status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Entries that differ between HEAD and the index or work tree.
    pub changed: usize,
    /// Tracked entries deleted from the work tree.
    pub missing: usize,
    /// Files unknown to the index.
    pub untracked: usize,
}

impl StatusReport {
    /// Count that decides whether a following commit has anything to record.
    pub fn pending(&self) -> usize {
        self.changed + self.missing
    }
}

/// Outcome of the rebase half of a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebaseStatus {
    Ok,
    UpToDate,
    FastForward,
    /// Conflicts halted the rebase; it is left in progress.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub rebase_status: RebaseStatus,
}

/// Per-ref result of a push, as reported by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefUpdateStatus {
    Ok,
    UpToDate,
    RejectedNonfastforward,
    RejectedNodelete,
    RejectedRemoteChanged,
    NonExisting,
    NotAttempted,
    RejectedOtherReason,
}

impl RefUpdateStatus {
    pub fn name(&self) -> &'static str {
        match self {
            RefUpdateStatus::Ok => "OK",
            RefUpdateStatus::UpToDate => "UP_TO_DATE",
            RefUpdateStatus::RejectedNonfastforward => "REJECTED_NONFASTFORWARD",
            RefUpdateStatus::RejectedNodelete => "REJECTED_NODELETE",
            RefUpdateStatus::RejectedRemoteChanged => "REJECTED_REMOTE_CHANGED",
            RefUpdateStatus::NonExisting => "NON_EXISTING",
            RefUpdateStatus::NotAttempted => "NOT_ATTEMPTED",
            RefUpdateStatus::RejectedOtherReason => "REJECTED_OTHER_REASON",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefUpdate {
    pub remote_ref: String,
    pub status: RefUpdateStatus,
    pub message: Option<String>,
}

impl RefUpdate {
    pub fn new(remote_ref: impl Into<String>, status: RefUpdateStatus) -> Self {
        Self {
            remote_ref: remote_ref.into(),
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
