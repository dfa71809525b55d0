use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, CredentialType, ErrorClass, ErrorCode, FetchOptions, IndexAddOption, PushOptions,
    RemoteCallbacks, Repository, ResetType, Signature, Status, StatusOptions,
};

use secrecy::ExposeSecret;

use crate::core::errors::{DisconnectReason, TransportError};
use crate::core::models::credential::Credential;
use crate::core::models::sync_operation::GenericCommand;
use crate::core::models::vcs_report::{
    PullReport, RebaseStatus, RefUpdate, RefUpdateStatus, StatusReport,
};
use crate::core::traits::vcs::Vcs;

/// libgit2 asks again after every rejected credential; stop after this many.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Identity recorded on commits made by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitAuthor {
    pub name: String,
    pub email: String,
}

/// `Vcs` implementation over a libgit2 work tree.
///
/// The repository is reopened on every call; `git2::Repository` is not
/// `Sync` and calls arrive on arbitrary blocking threads.
#[derive(Debug, Clone)]
pub struct GitRepository {
    work_tree: PathBuf,
    author: GitAuthor,
}

impl GitRepository {
    pub fn new(work_tree: PathBuf, author: GitAuthor) -> Self {
        Self { work_tree, author }
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn open(&self) -> Result<Repository, TransportError> {
        Repository::open(&self.work_tree).map_err(|e| map_git_error("open repository", e))
    }

    fn signature(&self) -> Result<Signature<'static>, TransportError> {
        Signature::now(&self.author.name, &self.author.email)
            .map_err(|e| map_git_error("build signature", e))
    }

    fn fetch(
        repo: &Repository,
        remote: &str,
        credential: &Credential,
    ) -> Result<(), TransportError> {
        let mut handle = repo
            .find_remote(remote)
            .map_err(|e| map_git_error("find remote", e))?;
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks(credential));
        handle
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| map_git_error("fetch", e))
    }

    fn add_all(repo: &Repository) -> Result<(), TransportError> {
        let mut index = repo.index().map_err(|e| map_git_error("read index", e))?;
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .and_then(|()| index.update_all(["*"], None))
            .and_then(|()| index.write())
            .map_err(|e| map_git_error("stage changes", e))
    }

    /// Check out `target` and move `branch` onto it.
    ///
    /// The checkout is safe: files in the way make it fail before the
    /// branch moves.
    fn fast_forward(
        repo: &Repository,
        branch: &str,
        target: git2::Oid,
    ) -> Result<(), TransportError> {
        let commit = repo
            .find_commit(target)
            .map_err(|e| map_git_error("resolve upstream", e))?;
        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::default().safe()))
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => local_changes_in_the_way(),
                _ => map_git_error("checkout", e),
            })?;

        let refname = format!("refs/heads/{branch}");
        repo.reference(&refname, target, true, "passync: fast-forward")
            .and_then(|_| repo.set_head(&refname))
            .map_err(|e| map_git_error("fast-forward", e))
    }

    fn rebase_onto(
        &self,
        repo: &Repository,
        upstream: &git2::AnnotatedCommit<'_>,
    ) -> Result<RebaseStatus, TransportError> {
        let head = repo
            .head()
            .and_then(|h| repo.reference_to_annotated_commit(&h))
            .map_err(|e| map_git_error("resolve HEAD", e))?;
        let signature = self.signature()?;

        let mut rebase = repo
            .rebase(Some(&head), Some(upstream), None, None)
            .map_err(|e| map_git_error("start rebase", e))?;

        while let Some(step) = rebase.next() {
            step.map_err(|e| map_git_error("rebase", e))?;

            let conflicted = repo
                .index()
                .map(|index| index.has_conflicts())
                .map_err(|e| map_git_error("read index", e))?;
            if conflicted {
                // Left in progress so it can be saved or aborted later.
                tracing::warn!(work_tree = %self.work_tree.display(), "rebase stopped on conflicts");
                return Ok(RebaseStatus::Stopped);
            }

            match rebase.commit(None, &signature, None) {
                Ok(_) => {}
                Err(e) if e.code() == ErrorCode::Applied => {}
                Err(e) => return Err(map_git_error("rebase commit", e)),
            }
        }

        rebase
            .finish(Some(&signature))
            .map_err(|e| map_git_error("finish rebase", e))?;
        Ok(RebaseStatus::Ok)
    }

    fn clone_into(url: &str, work_tree: &Path, credential: &Credential) -> Result<(), TransportError> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks(credential));
        RepoBuilder::new()
            .fetch_options(options)
            .clone(url, work_tree)
            .map(|_| ())
            .map_err(|e| map_git_error("clone", e))
    }
}

impl Vcs for GitRepository {
    fn status(&self) -> Result<StatusReport, TransportError> {
        let repo = self.open()?;
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);

        let statuses = repo
            .statuses(Some(&mut options))
            .map_err(|e| map_git_error("status", e))?;

        let changed_mask = Status::INDEX_NEW
            | Status::INDEX_MODIFIED
            | Status::INDEX_DELETED
            | Status::INDEX_RENAMED
            | Status::INDEX_TYPECHANGE
            | Status::WT_MODIFIED
            | Status::WT_RENAMED
            | Status::WT_TYPECHANGE;

        let mut report = StatusReport::default();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.contains(Status::WT_DELETED) {
                report.missing += 1;
            } else if status.intersects(changed_mask) {
                report.changed += 1;
            } else if status.contains(Status::WT_NEW) {
                report.untracked += 1;
            }
        }

        tracing::debug!(?report, "status");
        Ok(report)
    }

    fn commit(&self, message: &str) -> Result<(), TransportError> {
        let repo = self.open()?;
        let signature = self.signature()?;

        let tree = repo
            .index()
            .and_then(|mut index| index.write_tree())
            .and_then(|id| repo.find_tree(id))
            .map_err(|e| map_git_error("write tree", e))?;

        let parent = match repo.head() {
            Ok(head) => Some(
                head.peel_to_commit()
                    .map_err(|e| map_git_error("resolve HEAD", e))?,
            ),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(map_git_error("resolve HEAD", e)),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let id = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|e| map_git_error("commit", e))?;
        tracing::info!(commit = %id, "committed");
        Ok(())
    }

    fn pull(&self, remote: &str, credential: &Credential) -> Result<PullReport, TransportError> {
        let repo = self.open()?;
        let branch = current_branch(&repo)?;
        Self::fetch(&repo, remote, credential)?;

        let upstream_ref = format!("refs/remotes/{remote}/{branch}");
        let upstream = match repo.find_reference(&upstream_ref) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!(%upstream_ref, "no upstream yet, nothing to integrate");
                return Ok(PullReport {
                    rebase_status: RebaseStatus::UpToDate,
                });
            }
            Err(e) => return Err(map_git_error("find upstream", e)),
        };
        let upstream = repo
            .reference_to_annotated_commit(&upstream)
            .map_err(|e| map_git_error("resolve upstream", e))?;

        let (analysis, _) = repo
            .merge_analysis(&[&upstream])
            .map_err(|e| map_git_error("merge analysis", e))?;

        if !analysis.is_up_to_date() && self.status()?.pending() > 0 {
            return Err(local_changes_in_the_way());
        }

        let rebase_status = if analysis.is_up_to_date() {
            RebaseStatus::UpToDate
        } else if analysis.is_fast_forward() || analysis.is_unborn() {
            Self::fast_forward(&repo, &branch, upstream.id())?;
            RebaseStatus::FastForward
        } else {
            self.rebase_onto(&repo, &upstream)?
        };

        tracing::info!(%branch, ?rebase_status, "pulled");
        Ok(PullReport { rebase_status })
    }

    fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        force: bool,
        credential: &Credential,
    ) -> Result<Vec<RefUpdate>, TransportError> {
        let repo = self.open()?;
        let branch = match branch {
            Some(name) => name.to_string(),
            None => current_branch(&repo)?,
        };
        let local_ref = format!("refs/heads/{branch}");

        let local = repo
            .refname_to_id(&local_ref)
            .map_err(|e| map_git_error("resolve branch", e))?;
        if repo
            .refname_to_id(&format!("refs/remotes/{remote}/{branch}"))
            .is_ok_and(|tracked| tracked == local)
        {
            return Ok(vec![RefUpdate::new(local_ref, RefUpdateStatus::UpToDate)]);
        }

        let mut handle = repo
            .find_remote(remote)
            .map_err(|e| map_git_error("find remote", e))?;
        let refspec = if force {
            format!("+{local_ref}:{local_ref}")
        } else {
            format!("{local_ref}:{local_ref}")
        };

        let mut updates = Vec::new();
        let pushed = {
            let mut callbacks = callbacks(credential);
            callbacks.push_update_reference(|refname, status| {
                updates.push(match status {
                    None => RefUpdate::new(refname, RefUpdateStatus::Ok),
                    Some(message) => RefUpdate::new(refname, RefUpdateStatus::RejectedOtherReason)
                        .with_message(message),
                });
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            handle.push(&[refspec.as_str()], Some(&mut options))
        };

        match pushed {
            Ok(()) => {}
            Err(e) if e.code() == ErrorCode::NotFastForward => {
                return Ok(vec![RefUpdate::new(
                    local_ref,
                    RefUpdateStatus::RejectedNonfastforward,
                )]);
            }
            Err(e) => return Err(map_git_error("push", e)),
        }

        // Transports that report nothing rejected nothing.
        if updates.is_empty() {
            updates.push(RefUpdate::new(local_ref, RefUpdateStatus::Ok));
        }
        tracing::info!(%branch, updates = updates.len(), "pushed");
        Ok(updates)
    }

    fn run(&self, command: &GenericCommand, credential: &Credential) -> Result<(), TransportError> {
        match command {
            GenericCommand::Clone { url, work_tree } => Self::clone_into(url, work_tree, credential),
            GenericCommand::AddAll => Self::add_all(&self.open()?),
            GenericCommand::Fetch { remote } => Self::fetch(&self.open()?, remote, credential),
            GenericCommand::ResetHard { target } => {
                let repo = self.open()?;
                let object = repo
                    .revparse_single(target)
                    .map_err(|e| map_git_error("resolve reset target", e))?;
                repo.reset(&object, ResetType::Hard, None)
                    .map_err(|e| map_git_error("reset", e))
            }
            GenericCommand::CreateBranch { name } => {
                let repo = self.open()?;
                let head = repo
                    .head()
                    .and_then(|h| h.peel_to_commit())
                    .map_err(|e| map_git_error("resolve HEAD", e))?;
                repo.branch(name, &head, false)
                    .map(|_| ())
                    .map_err(|e| map_git_error("create branch", e))
            }
            GenericCommand::RebaseAbort => {
                let repo = self.open()?;
                match repo.open_rebase(None) {
                    Ok(mut rebase) => rebase.abort().map_err(|e| map_git_error("abort rebase", e)),
                    Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
                    Err(e) => Err(map_git_error("open rebase", e)),
                }
            }
        }
    }
}

fn current_branch(repo: &Repository) -> Result<String, TransportError> {
    let head = repo.head().map_err(|e| map_git_error("resolve HEAD", e))?;
    if !head.is_branch() {
        return Err(TransportError::failed(
            "HEAD is detached; run 'passync unstick' to recover",
        ));
    }
    head.shorthand()
        .map(str::to_string)
        .ok_or_else(|| TransportError::failed("branch name is not valid UTF-8"))
}

fn local_changes_in_the_way() -> TransportError {
    TransportError::failed(
        "uncommitted changes in the store would be overwritten by the pull; \
         run 'passync sync' to commit and push them",
    )
}

/// Credentials callback bound to the credential of one operation.
fn callbacks(credential: &Credential) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Callback,
                "Exhausted available authentication methods",
            ));
        }

        let username = username_from_url.unwrap_or(credential.username());
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(username);
        }

        match credential {
            Credential::SshKey { key_path, .. } if allowed.contains(CredentialType::SSH_KEY) => {
                Cred::ssh_key(username, None, key_path, credential.passphrase())
            }
            Credential::UserPassword { password, .. }
                if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) =>
            {
                Cred::userpass_plaintext(credential.username(), password.expose_secret())
            }
            _ => Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Callback,
                format!(
                    "remote does not accept {} authentication",
                    credential.mode().as_str()
                )
                .as_str(),
            )),
        }
    });
    callbacks
}

/// Translate a libgit2 failure into the transport taxonomy.
fn map_git_error(context: &str, err: git2::Error) -> TransportError {
    let message = format!("{context} failed");
    match (err.code(), err.class()) {
        (ErrorCode::User, _) => TransportError::Remote {
            message,
            source: Box::new(TransportError::Disconnected {
                reason: DisconnectReason::AuthCancelledByUser,
            }),
        },
        (ErrorCode::Auth, _) => TransportError::Remote {
            message,
            source: Box::new(TransportError::AuthExhausted {
                source: Box::new(err),
            }),
        },
        (_, ErrorClass::Net | ErrorClass::Ssh | ErrorClass::Http | ErrorClass::Ssl) => {
            TransportError::Remote {
                message,
                source: Box::new(err),
            }
        }
        _ => TransportError::Internal {
            message,
            source: Box::new(err),
        },
    }
}
