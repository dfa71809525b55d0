use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::errors::{PassyncError, Result};
use crate::core::models::credential::{AuthRequest, ConnectionMode};

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Current format version supported by this build of passync.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Top-level configuration read from `<data-dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub passync: PassyncSection,
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub git: GitSection,
}

impl AppConfig {
    /// Load the configuration from `<data-dir>/config.toml`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(PassyncError::InvalidConfig {
                detail: format!(
                    "{} not found. Run 'passync init' first.",
                    config_path.display()
                ),
            });
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content).map_err(|e| PassyncError::InvalidConfig {
            detail: format!("Failed to parse {CONFIG_FILE}: {e}"),
        })?;

        if config.passync.format_version > CURRENT_FORMAT_VERSION {
            return Err(PassyncError::FormatVersionTooNew {
                found: config.passync.format_version,
                supported: CURRENT_FORMAT_VERSION,
            });
        }

        config.validate()?;
        tracing::debug!(path = %config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Write the configuration, replacing any existing file.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let content = toml::to_string_pretty(self).map_err(|e| PassyncError::InvalidConfig {
            detail: format!("Failed to serialize configuration: {e}"),
        })?;
        std::fs::write(data_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("repository.remote", &self.repository.remote),
            ("repository.branch", &self.repository.branch),
            ("git.author_name", &self.git.author_name),
            ("git.author_email", &self.git.author_email),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PassyncError::InvalidConfig {
                    detail: format!("'{field}' must not be empty"),
                });
            }
        }
        if self.repository.remote.contains('/') {
            return Err(PassyncError::InvalidConfig {
                detail: format!(
                    "'repository.remote' must be a remote name, not a URL or path: {}",
                    self.repository.remote
                ),
            });
        }
        Ok(())
    }

    /// Work tree of the password store. Relative paths hang off `data_dir`.
    pub fn store_dir(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.repository.path)
    }

    pub fn ssh_key_path(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.connection.ssh_key)
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        ConnectionMode::parse(&self.connection.mode)
    }

    pub fn auth_request(&self, data_dir: &Path) -> AuthRequest {
        AuthRequest {
            mode: self.connection_mode(),
            username: self.connection.username.clone(),
            key_path: self.ssh_key_path(data_dir),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// The `[passync]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassyncSection {
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

impl Default for PassyncSection {
    fn default() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
        }
    }
}

fn default_format_version() -> u32 {
    1
}

/// The `[repository]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    pub path: PathBuf,
    pub remote: String,
    pub branch: String,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("store"),
            remote: "origin".into(),
            branch: "master".into(),
        }
    }
}

/// The `[connection]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// `ssh-key` or `username/password`.
    pub mode: String,
    pub username: String,
    pub ssh_key: PathBuf,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::SshKey.as_str().into(),
            username: "git".into(),
            ssh_key: PathBuf::from(".ssh_key"),
        }
    }
}

/// The `[git]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSection {
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            author_name: "passync".into(),
            author_email: "passync@localhost".into(),
            commit_message: "[passync] sync".into(),
        }
    }
}
