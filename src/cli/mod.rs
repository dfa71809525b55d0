pub mod commands;
pub mod context;
pub mod output;

use std::future::Future;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::errors::{PassyncError, Result};

/// Encrypted password store with authenticated git sync.
#[derive(Parser, Debug)]
#[command(name = "passync", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding config.toml, keys/ and the store
    #[arg(long, global = true, env = "PASSYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print operation results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, default config and a first key
    Init {
        /// Remote authentication: ssh-key or username/password
        #[arg(long, default_value = "ssh-key")]
        mode: String,
        /// Username for the remote
        #[arg(long, default_value = "git")]
        username: String,
        /// Do not generate a key
        #[arg(long)]
        no_key: bool,
    },

    /// Manage encryption keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Encrypt a secret read from stdin into the store
    Insert {
        /// Entry name, e.g. email/work
        name: String,
    },

    /// Decrypt an entry and print it
    Show {
        /// Entry name, e.g. email/work
        name: String,
    },

    /// Clone the remote password store
    Clone {
        /// Repository URL
        url: String,
    },

    /// Fetch and rebase onto the remote branch
    Pull,

    /// Push local commits
    Push,

    /// Commit local changes, rebase onto the remote and push
    Sync,

    /// Discard local state and match the remote branch
    Reset,

    /// Save a stuck rebase to a side branch on the remote and abort it
    Unstick,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Import a private key file
    Import {
        /// Path to the key file
        file: PathBuf,
    },
    /// Generate a new key
    Generate,
    /// List stored keys
    List,
    /// Show one key's public part
    Show {
        /// Key id
        id: String,
    },
    /// Delete a stored key
    Remove {
        /// Key id
        id: String,
    },
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PassyncError::TaskFailed {
            detail: format!("Failed to create async runtime: {e}"),
        })?;
    Ok(rt.block_on(future))
}
