use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

/// How the remote repository is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    SshKey,
    Password,
}

impl ConnectionMode {
    /// Parse a connection-mode tag. Only `ssh-key` (any case) selects key
    /// authentication; every other tag falls back to username/password.
    pub fn parse(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("ssh-key") {
            ConnectionMode::SshKey
        } else {
            ConnectionMode::Password
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::SshKey => "ssh-key",
            ConnectionMode::Password => "username/password",
        }
    }
}

/// Opaque authentication handle for one sync attempt. Never persisted.
pub enum Credential {
    UserPassword {
        username: String,
        password: SecretString,
    },
    SshKey {
        key_path: PathBuf,
        username: String,
        passphrase: SecretString,
    },
}

impl Credential {
    pub fn username(&self) -> &str {
        match self {
            Credential::UserPassword { username, .. } | Credential::SshKey { username, .. } => {
                username
            }
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        match self {
            Credential::UserPassword { .. } => ConnectionMode::Password,
            Credential::SshKey { .. } => ConnectionMode::SshKey,
        }
    }

    pub fn key_path(&self) -> Option<&Path> {
        match self {
            Credential::SshKey { key_path, .. } => Some(key_path),
            Credential::UserPassword { .. } => None,
        }
    }

    /// Passphrase for the key file, `None` for unprotected keys.
    pub fn passphrase(&self) -> Option<&str> {
        match self {
            Credential::SshKey { passphrase, .. } => {
                Some(passphrase.expose_secret()).filter(|p| !p.is_empty())
            }
            Credential::UserPassword { .. } => None,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::UserPassword { username, .. } => f
                .debug_struct("UserPassword")
                .field("username", username)
                .finish_non_exhaustive(),
            Credential::SshKey {
                key_path, username, ..
            } => f
                .debug_struct("SshKey")
                .field("key_path", key_path)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Inputs the credential resolver needs to pick and complete a scheme.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub mode: ConnectionMode,
    pub username: String,
    /// Where the ssh private key lives (or will be provisioned to).
    pub key_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_ssh_key_in_any_case() {
        assert_eq!(ConnectionMode::parse("ssh-key"), ConnectionMode::SshKey);
        assert_eq!(ConnectionMode::parse("SSH-Key"), ConnectionMode::SshKey);
        assert_eq!(ConnectionMode::parse("username/password"), ConnectionMode::Password);
        assert_eq!(ConnectionMode::parse(""), ConnectionMode::Password);
    }

    #[test]
    fn debug_never_prints_secrets() {
        let cred = Credential::UserPassword {
            username: "alice".into(),
            password: SecretString::from("hunter2".to_string()),
        };
        let debug = format!("{cred:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn empty_passphrase_reads_as_none() {
        let cred = Credential::SshKey {
            key_path: PathBuf::from("/tmp/key"),
            username: "git".into(),
            passphrase: SecretString::from(String::new()),
        };
        assert_eq!(cred.passphrase(), None);
        assert_eq!(cred.mode(), ConnectionMode::SshKey);
    }
}
