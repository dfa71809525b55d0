use std::path::PathBuf;

/// Boxed, thread-safe error used as the cause inside transport wrappers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Domain errors for key storage, configuration and authentication.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger.
#[derive(Debug, thiserror::Error)]
pub enum PassyncError {
    #[error(
        "Could not create key directory {path}: {source}\n\n  \
         Check that the parent directory exists and is writable."
    )]
    KeyDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Key directory does not exist: {path}\n\n  \
         Import or generate a key first:\n    \
         → passync keys import <file>\n    \
         → passync keys generate"
    )]
    KeyDirMissing { path: PathBuf },

    #[error(
        "No keys available in {path}\n\n  \
         Import or generate a key first: passync keys generate"
    )]
    KeyDirEmpty { path: PathBuf },

    #[error(
        "No key found with id '{id}'\n\n  \
         Run 'passync keys list' to see the stored keys."
    )]
    KeyNotFound { id: String },

    #[error("Could not delete key file {path}: {source}")]
    KeyDelete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Invalid key id '{id}'\n\n  \
         Key ids may only contain letters, digits, '.', '_' and '-'."
    )]
    InvalidKeyId { id: String },

    #[error("Invalid key in {origin}: {reason}")]
    InvalidKey { origin: String, reason: String },

    #[error(
        "Invalid entry name '{name}'\n\n  \
         Use a relative path such as 'email/work' without '..' components."
    )]
    InvalidEntryName { name: String },

    #[error(
        "No password entry at {path}\n\n  \
         Run 'passync pull' if it was added on another device."
    )]
    EntryNotFound { path: PathBuf },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error(
        "Decryption failed: {reason}\n\n  \
         None of the stored keys can open this entry."
    )]
    DecryptionFailed { reason: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "This data directory uses format version {found}, but this build \
         only supports up to version {supported}."
    )]
    FormatVersionTooNew { found: u32, supported: u32 },

    #[error(
        "Key provisioning failed: {detail}\n\n  \
         Solutions:\n    \
         → Import an existing key: passync keys import <file>\n    \
         → Or check that 'ssh-keygen' is installed"
    )]
    KeyProvisioning { detail: String },

    #[error("Prompt failed: {detail}")]
    Prompt { detail: String },

    #[error("Background task failed: {detail}")]
    TaskFailed { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PassyncError>;

impl From<tokio::task::JoinError> for PassyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        PassyncError::TaskFailed {
            detail: err.to_string(),
        }
    }
}

/// Why a transport session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    AuthCancelledByUser,
    ConnectionLost,
    ProtocolError,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DisconnectReason::AuthCancelledByUser => "auth cancelled by user",
            DisconnectReason::ConnectionLost => "connection lost",
            DisconnectReason::ProtocolError => "protocol error",
        };
        f.write_str(text)
    }
}

/// Failures raised by the version-control layer.
///
/// `Remote`, `Internal` and `AuthExhausted` are wrappers: they carry the
/// lower-level failure as their source. `Disconnected` and `Failed` are leaves.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A remote transport failure (network, ssh, http).
    #[error("{message}")]
    Remote {
        message: String,
        #[source]
        source: BoxError,
    },

    /// An internal failure of the version-control library.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Exhausted available authentication methods")]
    AuthExhausted {
        #[source]
        source: BoxError,
    },

    #[error("Disconnected: {reason}")]
    Disconnected { reason: DisconnectReason },

    #[error("{message}")]
    Failed { message: String },
}

impl TransportError {
    /// Whether this variant only wraps a more specific cause.
    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            TransportError::Remote { .. }
                | TransportError::Internal { .. }
                | TransportError::AuthExhausted { .. }
        )
    }

    pub fn failed(message: impl Into<String>) -> Self {
        TransportError::Failed {
            message: message.into(),
        }
    }
}

/// Classified pull failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PullError {
    #[error(
        "Rebase stopped on conflicts\n\n  \
         Local and remote changes touch the same entries.\n  \
         Run 'passync unstick' to save local work to a side branch on the remote.\n  \
         Once it is saved there, 'passync reset' aligns the store with the remote."
    )]
    RebaseFailed,
}

/// Classified push failures, one per rejected remote ref update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error(
        "Push rejected: the remote has changes you do not have (non-fast-forward)\n\n  \
         Run 'passync pull' first, then push again."
    )]
    NonFastForward,

    #[error(
        "Push rejected by the remote (non-fast-forward)\n\n  \
         The remote refused the update; pull and retry."
    )]
    RemoteRejected,

    #[error("Push failed: {0}")]
    Generic(String),
}

/// Error produced by a sync pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    Pull(#[from] PullError),

    #[error("{0}")]
    Push(#[from] PushError),

    /// A command failed and its transport error is kept as-is.
    #[error("{command} failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Background task failed: {detail}")]
    Task { detail: String },
}

impl SyncError {
    /// Whether the failure is a user abandoning authentication.
    pub fn is_user_cancelled(&self) -> bool {
        crate::core::services::error_classifier::is_user_cancelled(self)
    }

    /// The most specific failure after stripping transport wrappers.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        match self {
            SyncError::Command { source, .. } => {
                crate::core::services::error_classifier::root_cause(source)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_reason_display_matches_transport_wording() {
        let err = TransportError::Disconnected {
            reason: DisconnectReason::AuthCancelledByUser,
        };
        assert_eq!(err.to_string(), "Disconnected: auth cancelled by user");
    }

    #[test]
    fn only_wrapping_variants_are_wrappers() {
        let leaf = TransportError::failed("boom");
        assert!(!leaf.is_wrapper());

        let wrapped = TransportError::Remote {
            message: "fetch failed".into(),
            source: Box::new(TransportError::failed("boom")),
        };
        assert!(wrapped.is_wrapper());
    }

    #[test]
    fn command_error_exposes_transport_source() {
        use std::error::Error;

        let err = SyncError::Command {
            command: "push",
            source: TransportError::failed("remote hung up"),
        };
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<TransportError>().is_some());
        assert_eq!(err.to_string(), "push failed: remote hung up");
    }
}
