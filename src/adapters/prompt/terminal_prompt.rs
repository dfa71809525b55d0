use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use colored::Colorize;
use secrecy::SecretString;

use crate::adapters::git::ssh_keygen::SshKeygen;
use crate::core::errors::{PassyncError, Result};
use crate::core::traits::prompt::{KeyChoice, KeyProvisioner, PromptResponse, Prompter, SecretPrompt};

/// Prompts on stderr and reads answers from stdin.
///
/// End of input counts as dismissing the prompt. Secrets typed on a
/// terminal are not echoed. Reads happen on the blocking pool so the
/// runtime thread is never parked on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask_secret(&self, prompt: &SecretPrompt) -> impl Future<Output = Result<PromptResponse>> + Send {
        let prompt = prompt.clone();
        async move {
            let line = blocking_read(move || {
                eprintln!("\n{}", prompt.title.bold());
                eprintln!("  {}", prompt.message);
                if prompt.show_error {
                    eprintln!("  {} Wrong passphrase", "✗".red());
                }
                eprint!("  {}: ", prompt.hint);
                io::stderr().flush()?;
                read_secret(io::stdin().is_terminal())
            })
            .await?;

            Ok(match line {
                Some(text) => PromptResponse::Entered(SecretString::from(text)),
                None => PromptResponse::Cancelled,
            })
        }
    }

    fn choose_key_provisioning(&self) -> impl Future<Output = Result<KeyChoice>> + Send {
        async {
            let line = blocking_read(|| {
                eprintln!("\n{}", "No ssh key found".bold());
                eprintln!("  1. Import an existing private key");
                eprintln!("  2. Generate a new key");
                eprintln!("  3. Cancel");
                eprint!("  Selection [3]: ");
                io::stderr().flush()?;
                read_line()
            })
            .await?;

            Ok(match line.as_deref().map(str::trim) {
                Some("1") => KeyChoice::Import,
                Some("2") => KeyChoice::Generate,
                _ => KeyChoice::Cancel,
            })
        }
    }
}

/// Imports a key file named on stdin, or generates one with `ssh-keygen`.
#[derive(Debug, Clone, Default)]
pub struct TerminalProvisioner {
    keygen: SshKeygen,
}

impl TerminalProvisioner {
    pub fn new(keygen: SshKeygen) -> Self {
        Self { keygen }
    }
}

impl KeyProvisioner for TerminalProvisioner {
    fn provision(&self, choice: KeyChoice, dest: &Path) -> impl Future<Output = Result<()>> + Send {
        let keygen = self.keygen.clone();
        let dest = dest.to_path_buf();
        async move {
            match choice {
                KeyChoice::Generate => {
                    tokio::task::spawn_blocking(move || keygen.generate(&dest)).await?
                }
                KeyChoice::Import => {
                    let source = blocking_read(|| {
                        eprint!("  Path to your private key: ");
                        io::stderr().flush()?;
                        read_line()
                    })
                    .await?
                    .ok_or_else(|| PassyncError::KeyProvisioning {
                        detail: "no key path entered".into(),
                    })?;
                    tokio::task::spawn_blocking(move || import_key(Path::new(source.trim()), &dest))
                        .await?
                }
                KeyChoice::Cancel => Ok(()),
            }
        }
    }
}

fn import_key(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_file() {
        return Err(PassyncError::KeyProvisioning {
            detail: format!("{} is not a file", source.display()),
        });
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(source, dest)?;
    restrict_permissions(dest)?;
    tracing::info!(from = %source.display(), to = %dest.display(), "ssh key imported");
    Ok(())
}

/// ssh refuses private keys readable by others.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

async fn blocking_read<F>(job: F) -> Result<Option<String>>
where
    F: FnOnce() -> io::Result<Option<String>> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await?
        .map_err(|e| PassyncError::Prompt {
            detail: e.to_string(),
        })
}

/// A secret from the terminal with echo off, or a plain line when input
/// is piped.
fn read_secret(interactive: bool) -> io::Result<Option<String>> {
    if !interactive {
        return read_line();
    }
    match rpassword::read_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

/// One line from stdin without its line ending; `None` at end of input.
fn read_line() -> io::Result<Option<String>> {
    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    let trimmed = input.trim_end_matches(['\r', '\n']).len();
    input.truncate(trimmed);
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_copies_and_restricts_key() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("id_rsa");
        std::fs::write(&source, "PRIVATE").unwrap();
        let dest = dir.path().join("data").join(".ssh_key");

        import_key(&source, &dest).unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "PRIVATE");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn import_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_key(&dir.path().join("absent"), &dir.path().join("dest")).unwrap_err();
        assert!(matches!(err, PassyncError::KeyProvisioning { .. }));
    }
}
