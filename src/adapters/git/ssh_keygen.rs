use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use secrecy::{ExposeSecret, SecretString};

use crate::core::errors::{PassyncError, Result};
use crate::core::traits::prompt::PassphraseVerifier;

/// Key checks and generation through the system `ssh-keygen` binary.
#[derive(Debug, Clone)]
pub struct SshKeygen {
    binary: PathBuf,
}

impl SshKeygen {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ssh-keygen"),
        }
    }

    #[cfg(test)]
    fn with_path(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn is_available(&self) -> bool {
        // `ssh-keygen` has no --version; -? prints usage and exits non-zero.
        Command::new(&self.binary).arg("-?").output().is_ok()
    }

    /// Create an unprotected ed25519 key at `dest` (and `dest.pub`).
    pub fn generate(&self, dest: &Path) -> Result<()> {
        if !self.is_available() {
            return Err(PassyncError::KeyProvisioning {
                detail: format!("{} was not found on this system", self.binary.display()),
            });
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dest_arg = dest.to_string_lossy();
        let output = self.run(&[
            "-q", "-t", "ed25519", "-N", "", "-C", "passync", "-f", &dest_arg,
        ])?;

        if !output.status.success() {
            return Err(PassyncError::KeyProvisioning {
                detail: format!(
                    "ssh-keygen exited with error: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        tracing::info!(path = %dest.display(), "ssh key generated");
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| PassyncError::KeyProvisioning {
                detail: format!("Failed to run {}: {e}", self.binary.display()),
            })
    }
}

impl Default for SshKeygen {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseVerifier for SshKeygen {
    fn is_encrypted(&self, key_path: &Path) -> Result<bool> {
        Ok(!self.verify(key_path, &SecretString::from(String::new()))?)
    }

    /// Deriving the public half only succeeds with the right passphrase.
    ///
    /// The passphrase is passed with `-P`, so it is briefly visible in the
    /// process list of the local machine.
    fn verify(&self, key_path: &Path, passphrase: &SecretString) -> Result<bool> {
        let path_arg = key_path.to_string_lossy();
        let output = self.run(&["-y", "-P", passphrase.expose_secret(), "-f", &path_arg])?;
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keygen() -> Option<SshKeygen> {
        let keygen = SshKeygen::new();
        keygen.is_available().then_some(keygen)
    }

    #[test]
    fn generated_key_is_unprotected() {
        let Some(keygen) = keygen() else {
            eprintln!("ssh-keygen not installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("nested").join("id_ed25519");

        keygen.generate(&key).unwrap();

        assert!(key.is_file());
        assert!(dir.path().join("nested/id_ed25519.pub").is_file());
        assert!(!keygen.is_encrypted(&key).unwrap());
    }

    #[test]
    fn protected_key_needs_its_passphrase() {
        let Some(keygen) = keygen() else {
            eprintln!("ssh-keygen not installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("id_ed25519");
        let status = Command::new("ssh-keygen")
            .args(["-q", "-t", "ed25519", "-N", "open sesame", "-f"])
            .arg(&key)
            .status()
            .unwrap();
        assert!(status.success());

        assert!(keygen.is_encrypted(&key).unwrap());
        assert!(!keygen.verify(&key, &SecretString::from("wrong".to_string())).unwrap());
        assert!(keygen.verify(&key, &SecretString::from("open sesame".to_string())).unwrap());
    }

    #[test]
    fn missing_binary_is_reported_before_generating() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("id_ed25519");
        let keygen = SshKeygen::with_path(PathBuf::from("/nonexistent/ssh-keygen"));
        assert!(!keygen.is_available());

        let err = keygen.generate(&dest).unwrap_err();

        assert!(matches!(err, PassyncError::KeyProvisioning { .. }));
        assert!(err.to_string().contains("/nonexistent/ssh-keygen was not found"));
        assert!(!dir.path().join("nested").exists());
    }
}
