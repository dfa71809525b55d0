use crate::core::errors::Result;
use crate::core::models::credential::AuthRequest;
use crate::core::models::outcome::SyncOutcome;
use crate::core::models::sync_operation::SyncOperation;
use crate::core::services::credential_resolver::CredentialResolver;
use crate::core::services::sync_executor::SyncExecutor;
use crate::core::traits::prompt::{KeyProvisioner, PassphraseVerifier, Prompter};
use crate::core::traits::vcs::Vcs;

/// Authenticates, then runs one operation with the resulting credential.
pub struct SyncService<P, K, V, G> {
    pub resolver: CredentialResolver<P, K, V>,
    pub executor: SyncExecutor<G>,
}

impl<P, K, V, G> SyncService<P, K, V, G>
where
    P: Prompter,
    K: KeyProvisioner,
    V: PassphraseVerifier,
    G: Vcs,
{
    pub fn new(resolver: CredentialResolver<P, K, V>, executor: SyncExecutor<G>) -> Self {
        Self { resolver, executor }
    }

    /// A cancelled prompt ends the operation before any command runs.
    pub async fn execute_after_authentication(
        &self,
        request: &AuthRequest,
        operation: SyncOperation,
    ) -> Result<SyncOutcome> {
        let outcome = self
            .resolver
            .resolve_then(request, |credential| async move {
                self.executor.execute(&operation, credential).await
            })
            .await?;
        Ok(outcome.unwrap_or(SyncOutcome::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use secrecy::SecretString;

    use super::*;
    use crate::core::errors::TransportError;
    use crate::core::models::credential::{ConnectionMode, Credential};
    use crate::core::models::sync_operation::GenericCommand;
    use crate::core::models::vcs_report::{PullReport, RebaseStatus, RefUpdate, StatusReport};
    use crate::core::traits::prompt::{KeyChoice, PromptResponse, SecretPrompt};

    struct OneAnswer(Option<&'static str>);

    impl Prompter for OneAnswer {
        fn ask_secret(
            &self,
            _prompt: &SecretPrompt,
        ) -> impl Future<Output = Result<PromptResponse>> + Send {
            std::future::ready(Ok(match self.0 {
                Some(text) => PromptResponse::Entered(SecretString::from(text.to_string())),
                None => PromptResponse::Cancelled,
            }))
        }

        fn choose_key_provisioning(&self) -> impl Future<Output = Result<KeyChoice>> + Send {
            std::future::ready(Ok(KeyChoice::Cancel))
        }
    }

    struct NoProvisioning;

    impl KeyProvisioner for NoProvisioning {
        fn provision(&self, _choice: KeyChoice, _dest: &Path) -> impl Future<Output = Result<()>> + Send {
            std::future::ready(Ok(()))
        }
    }

    struct AcceptAll;

    impl PassphraseVerifier for AcceptAll {
        fn is_encrypted(&self, _key_path: &Path) -> Result<bool> {
            Ok(false)
        }

        fn verify(&self, _key_path: &Path, _passphrase: &SecretString) -> Result<bool> {
            Ok(true)
        }
    }

    #[derive(Default)]
    struct CountingVcs {
        users: Arc<Mutex<Vec<String>>>,
    }

    impl Vcs for CountingVcs {
        fn status(&self) -> std::result::Result<StatusReport, TransportError> {
            Ok(StatusReport::default())
        }

        fn commit(&self, _message: &str) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        fn pull(
            &self,
            _remote: &str,
            credential: &Credential,
        ) -> std::result::Result<PullReport, TransportError> {
            self.users.lock().unwrap().push(credential.username().to_string());
            Ok(PullReport {
                rebase_status: RebaseStatus::UpToDate,
            })
        }

        fn push(
            &self,
            _remote: &str,
            _branch: Option<&str>,
            _force: bool,
            _credential: &Credential,
        ) -> std::result::Result<Vec<RefUpdate>, TransportError> {
            Ok(Vec::new())
        }

        fn run(
            &self,
            _command: &GenericCommand,
            _credential: &Credential,
        ) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    fn service(
        answer: Option<&'static str>,
        vcs: CountingVcs,
    ) -> SyncService<OneAnswer, NoProvisioning, AcceptAll, CountingVcs> {
        SyncService::new(
            CredentialResolver::new(OneAnswer(answer), NoProvisioning, AcceptAll),
            SyncExecutor::new(vcs),
        )
    }

    fn request() -> AuthRequest {
        AuthRequest {
            mode: ConnectionMode::Password,
            username: "alice".into(),
            key_path: PathBuf::from("/unused"),
        }
    }

    #[tokio::test]
    async fn runs_operation_with_resolved_credential() {
        let vcs = CountingVcs::default();
        let users = Arc::clone(&vcs.users);

        let outcome = service(Some("pw"), vcs)
            .execute_after_authentication(&request(), SyncOperation::pull("origin"))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(*users.lock().unwrap(), ["alice"]);
    }

    #[tokio::test]
    async fn cancelled_prompt_runs_nothing() {
        let vcs = CountingVcs::default();
        let users = Arc::clone(&vcs.users);

        let outcome = service(None, vcs)
            .execute_after_authentication(&request(), SyncOperation::pull("origin"))
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Cancelled));
        assert!(users.lock().unwrap().is_empty());
    }
}
