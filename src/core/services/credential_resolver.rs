use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;

use crate::core::errors::Result;
use crate::core::models::credential::{AuthRequest, ConnectionMode, Credential};
use crate::core::traits::prompt::{
    KeyChoice, KeyProvisioner, PassphraseVerifier, PromptResponse, Prompter, SecretPrompt,
};

/// Terminal state of one authentication attempt.
#[derive(Debug)]
pub enum Resolution {
    Authenticated(Credential),
    /// The user dismissed a prompt. Not a failure.
    Cancelled,
}

/// Picks the authentication scheme for a request and completes it,
/// prompting the user as needed.
///
/// Key-based flow:
/// 1. While no key file exists, ask the user to import or generate one.
/// 2. An unprotected key authenticates immediately.
/// 3. Otherwise ask for the passphrase until it unlocks the key or the
///    user cancels. Every retry flags the previous answer as wrong.
///
/// Password flow: a single prompt, nothing remembered between attempts.
pub struct CredentialResolver<P, K, V> {
    prompter: P,
    provisioner: K,
    verifier: Arc<V>,
}

impl<P, K, V> CredentialResolver<P, K, V>
where
    P: Prompter,
    K: KeyProvisioner,
    V: PassphraseVerifier,
{
    pub fn new(prompter: P, provisioner: K, verifier: V) -> Self {
        Self {
            prompter,
            provisioner,
            verifier: Arc::new(verifier),
        }
    }

    pub async fn resolve(&self, request: &AuthRequest) -> Result<Resolution> {
        tracing::debug!(mode = request.mode.as_str(), username = %request.username, "resolving credential");
        match request.mode {
            ConnectionMode::SshKey => self.resolve_ssh_key(request).await,
            ConnectionMode::Password => self.resolve_password(request).await,
        }
    }

    /// Resolve, then hand the credential to `continuation` exactly once.
    /// Returns `None` when the user cancelled.
    pub async fn resolve_then<F, Fut, T>(
        &self,
        request: &AuthRequest,
        continuation: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(Credential) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.resolve(request).await? {
            Resolution::Authenticated(credential) => Ok(Some(continuation(credential).await)),
            Resolution::Cancelled => {
                tracing::info!("authentication cancelled by user");
                Ok(None)
            }
        }
    }

    async fn resolve_ssh_key(&self, request: &AuthRequest) -> Result<Resolution> {
        while !key_present(&request.key_path).await? {
            let choice = self.prompter.choose_key_provisioning().await?;
            if choice == KeyChoice::Cancel {
                return Ok(Resolution::Cancelled);
            }
            self.provisioner.provision(choice, &request.key_path).await?;
            tracing::info!(?choice, path = %request.key_path.display(), "ssh key provisioned");
        }

        if !self.is_encrypted(&request.key_path).await? {
            return Ok(Resolution::Authenticated(ssh_credential(
                request,
                SecretString::from(String::new()),
            )));
        }

        let mut prompt = SecretPrompt {
            title: "Unlock ssh key".into(),
            message: format!(
                "Enter the passphrase for {}",
                request.key_path.display()
            ),
            hint: "Passphrase".into(),
            show_error: false,
        };
        loop {
            let passphrase = match self.prompter.ask_secret(&prompt).await? {
                PromptResponse::Entered(passphrase) => passphrase,
                PromptResponse::Cancelled => return Ok(Resolution::Cancelled),
            };

            let (accepted, passphrase) = self.verify(&request.key_path, passphrase).await?;
            if accepted {
                return Ok(Resolution::Authenticated(ssh_credential(request, passphrase)));
            }
            tracing::debug!("wrong passphrase, asking again");
            prompt.show_error = true;
        }
    }

    async fn resolve_password(&self, request: &AuthRequest) -> Result<Resolution> {
        let prompt = SecretPrompt {
            title: "Authenticate".into(),
            message: format!("Enter the password for {}", request.username),
            hint: "Password".into(),
            show_error: false,
        };
        Ok(match self.prompter.ask_secret(&prompt).await? {
            PromptResponse::Entered(password) => {
                Resolution::Authenticated(Credential::UserPassword {
                    username: request.username.clone(),
                    password,
                })
            }
            PromptResponse::Cancelled => Resolution::Cancelled,
        })
    }

    async fn is_encrypted(&self, key_path: &Path) -> Result<bool> {
        let verifier = Arc::clone(&self.verifier);
        let path = key_path.to_path_buf();
        tokio::task::spawn_blocking(move || verifier.is_encrypted(&path)).await?
    }

    /// Check a passphrase off the async thread; the secret travels back
    /// with the answer so it is never copied.
    async fn verify(
        &self,
        key_path: &Path,
        passphrase: SecretString,
    ) -> Result<(bool, SecretString)> {
        let verifier = Arc::clone(&self.verifier);
        let path = key_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            verifier
                .verify(&path, &passphrase)
                .map(|accepted| (accepted, passphrase))
        })
        .await?
    }
}

async fn key_present(path: &Path) -> Result<bool> {
    let path = path.to_path_buf();
    Ok(tokio::task::spawn_blocking(move || path.is_file()).await?)
}

fn ssh_credential(request: &AuthRequest, passphrase: SecretString) -> Credential {
    Credential::SshKey {
        key_path: request.key_path.clone(),
        username: request.username.clone(),
        passphrase,
    }
}
