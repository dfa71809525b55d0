use std::path::{Path, PathBuf};

use crate::adapters::git::git_repository::{GitAuthor, GitRepository};
use crate::adapters::git::ssh_keygen::SshKeygen;
use crate::adapters::prompt::terminal_prompt::{TerminalPrompter, TerminalProvisioner};
use crate::cli::{block_on, output};
use crate::config::app_config::AppConfig;
use crate::core::errors::{PassyncError, Result};
use crate::core::models::sync_operation::SyncOperation;
use crate::core::services::credential_resolver::CredentialResolver;
use crate::core::services::operation_hooks::CloneCleanup;
use crate::core::services::sync_executor::SyncExecutor;
use crate::core::services::sync_service::SyncService;

/// Which repository operation a command maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pull,
    Push,
    Sync,
    Reset,
    Unstick,
}

/// Execute `passync clone <url>`.
pub fn clone(data_dir: &Path, url: &str, json: bool) -> Result<i32> {
    let config = AppConfig::load(data_dir)?;
    let store_dir = config.store_dir(data_dir);

    if store_dir.exists() && std::fs::read_dir(&store_dir)?.next().is_some() {
        return Err(PassyncError::InvalidConfig {
            detail: format!(
                "{} already exists and is not empty.\n\n  \
                 Remove it or point 'repository.path' somewhere else.",
                store_dir.display()
            ),
        });
    }

    if !json {
        output::header(&format!("Cloning {url}"));
    }
    let operation =
        SyncOperation::clone_repo(url, store_dir.clone()).with_hooks(CloneCleanup::new(&store_dir));
    run(data_dir, &config, store_dir, operation, json)
}

/// Execute one of the operations on an existing store.
pub fn execute(data_dir: &Path, action: Action, json: bool) -> Result<i32> {
    let config = AppConfig::load(data_dir)?;
    let store_dir = config.store_dir(data_dir);
    if !store_dir.join(".git").exists() {
        return Err(PassyncError::InvalidConfig {
            detail: format!(
                "No password store at {}\n\n  \
                 Clone one first: passync clone <url>",
                store_dir.display()
            ),
        });
    }

    let remote = config.repository.remote.as_str();
    let branch = config.repository.branch.as_str();
    let operation = match action {
        Action::Pull => SyncOperation::pull(remote),
        Action::Push => SyncOperation::push(remote),
        Action::Sync => SyncOperation::sync(remote, &config.git.commit_message),
        Action::Reset => SyncOperation::reset_to_remote(remote, branch),
        Action::Unstick => {
            let side_branch = format!(
                "conflicting-{branch}-{}",
                chrono::Utc::now().format("%Y%m%d%H%M%S")
            );
            tracing::info!(%side_branch, "saving local work");
            if !json {
                output::warning(&format!("Saving local work to '{side_branch}'"));
            }
            SyncOperation::break_out_of_detached(remote, &side_branch)
        }
    };

    if !json {
        output::header(&format!("passync {}", operation.kind()));
    }
    run(data_dir, &config, store_dir, operation, json)
}

/// Authenticate, run the operation and report its outcome as an exit code.
fn run(
    data_dir: &Path,
    config: &AppConfig,
    store_dir: PathBuf,
    operation: SyncOperation,
    json: bool,
) -> Result<i32> {
    let keygen = SshKeygen::new();
    let resolver = CredentialResolver::new(
        TerminalPrompter,
        TerminalProvisioner::new(keygen.clone()),
        keygen,
    );
    let repository = GitRepository::new(
        store_dir,
        GitAuthor {
            name: config.git.author_name.clone(),
            email: config.git.author_email.clone(),
        },
    );
    let service = SyncService::new(resolver, SyncExecutor::new(repository));

    let request = config.auth_request(data_dir);
    let outcome = block_on(service.execute_after_authentication(&request, operation))??;

    if json {
        output::outcome_json(&outcome);
    } else {
        output::outcome(&outcome);
    }
    Ok(outcome.exit_code())
}
