use crate::core::errors::TransportError;
use crate::core::models::credential::Credential;
use crate::core::models::sync_operation::GenericCommand;
use crate::core::models::vcs_report::{PullReport, RefUpdate, StatusReport};

/// Port for command-level access to the password repository.
///
/// Every method blocks; the executor dispatches each call to a
/// blocking worker. Remote commands authenticate with the credential of
/// the current operation only.
pub trait Vcs: Send + Sync + 'static {
    fn status(&self) -> Result<StatusReport, TransportError>;

    fn commit(&self, message: &str) -> Result<(), TransportError>;

    /// Fetch `remote` and rebase the current branch onto its upstream.
    fn pull(&self, remote: &str, credential: &Credential) -> Result<PullReport, TransportError>;

    /// Push `branch` (current branch when `None`) and report every ref update.
    fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        force: bool,
        credential: &Credential,
    ) -> Result<Vec<RefUpdate>, TransportError>;

    fn run(&self, command: &GenericCommand, credential: &Credential)
    -> Result<(), TransportError>;
}
