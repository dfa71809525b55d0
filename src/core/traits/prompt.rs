use std::future::Future;
use std::path::Path;

use secrecy::SecretString;

use crate::core::errors::Result;

/// A labeled secret-entry dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPrompt {
    pub title: String,
    pub message: String,
    pub hint: String,
    /// Flag the previous answer as wrong.
    pub show_error: bool,
}

/// What the user did with a prompt.
#[derive(Debug)]
pub enum PromptResponse {
    Entered(SecretString),
    Cancelled,
}

/// Answer to "no ssh key found, what now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChoice {
    Import,
    Generate,
    Cancel,
}

/// Interactive prompt UI. Each call is a suspension point.
pub trait Prompter: Send + Sync {
    fn ask_secret(&self, prompt: &SecretPrompt)
    -> impl Future<Output = Result<PromptResponse>> + Send;

    fn choose_key_provisioning(&self) -> impl Future<Output = Result<KeyChoice>> + Send;
}

/// Imports or generates the ssh key the resolver asked for.
pub trait KeyProvisioner: Send + Sync {
    fn provision(&self, choice: KeyChoice, dest: &Path)
    -> impl Future<Output = Result<()>> + Send;
}

/// Blocking checks against an ssh private key file.
pub trait PassphraseVerifier: Send + Sync + 'static {
    fn is_encrypted(&self, key_path: &Path) -> Result<bool>;

    fn verify(&self, key_path: &Path, passphrase: &SecretString) -> Result<bool>;
}
