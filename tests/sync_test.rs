use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn passync(data_dir: &assert_fs::TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("passync");
    cmd.env("PASSYNC_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

/// A bare repository with one empty commit on master.
fn seed_remote(path: &Path) {
    let repo = git2::Repository::init_bare(path).unwrap();
    let sig = git2::Signature::now("seed", "seed@example.org").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    repo.commit(Some("refs/heads/master"), &sig, &sig, "seed", &tree, &[])
        .unwrap();
    repo.set_head("refs/heads/master").unwrap();
}

fn remote_head_message(path: &Path) -> String {
    let repo = git2::Repository::open_bare(path).unwrap();
    let commit = repo
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    commit.message().unwrap_or_default().to_string()
}

/// Write `file` in the work tree at `path` and commit it on HEAD.
fn commit_file(path: &Path, file: &str, content: &str, message: &str) {
    let repo = git2::Repository::open(path).unwrap();
    std::fs::write(path.join(file), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("other", "other@example.org").unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
        .unwrap();
}

/// Another writer clones `remote`, commits `file` and pushes master.
fn push_from_elsewhere(remote: &Path, file: &str, content: &str, message: &str) {
    let scratch = assert_fs::TempDir::new().unwrap();
    let repo = git2::Repository::clone(remote.to_str().unwrap(), scratch.path()).unwrap();
    commit_file(scratch.path(), file, content, message);
    repo.find_remote("origin")
        .unwrap()
        .push(&["refs/heads/master:refs/heads/master"], None)
        .unwrap();
}

/// Initialized data dir (password auth) with the remote cloned into it.
fn cloned_store() -> (assert_fs::TempDir, assert_fs::TempDir) {
    let remote = assert_fs::TempDir::new().unwrap();
    seed_remote(remote.path());

    let data = assert_fs::TempDir::new().unwrap();
    passync(&data)
        .args(["init", "--mode", "username/password", "--username", "alice"])
        .assert()
        .success();
    passync(&data)
        .arg("clone")
        .arg(remote.path())
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Clone complete"));

    (data, remote)
}

#[test]
fn clone_checks_out_the_remote() {
    let (data, _remote) = cloned_store();
    data.child("store/.git").assert(predicate::path::exists());
}

#[test]
fn sync_commits_and_pushes_new_entry() {
    let (data, remote) = cloned_store();

    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("s3cret\n")
        .assert()
        .success();

    passync(&data)
        .arg("sync")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("refs/heads/master"))
        .stdout(predicate::str::contains("Sync complete"));

    assert_eq!(remote_head_message(remote.path()), "[passync] sync");
}

#[test]
fn sync_without_changes_skips_commit() {
    let (data, remote) = cloned_store();

    passync(&data)
        .arg("sync")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to commit"));

    assert_eq!(remote_head_message(remote.path()), "seed");
}

#[test]
fn dismissed_password_prompt_exits_130() {
    let (data, remote) = cloned_store();
    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("s3cret\n")
        .assert()
        .success();

    passync(&data)
        .arg("sync")
        .write_stdin("")
        .assert()
        .code(130)
        .stdout(predicate::str::contains("Cancelled"));

    assert_eq!(remote_head_message(remote.path()), "seed");
}

#[test]
fn pull_and_push_with_nothing_to_do_succeed() {
    let (data, _remote) = cloned_store();

    passync(&data)
        .arg("pull")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("UpToDate"));

    passync(&data)
        .arg("push")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("UP_TO_DATE"));
}

#[test]
fn reset_returns_to_remote_state() {
    let (data, _remote) = cloned_store();

    passync(&data)
        .arg("reset")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("complete (3 commands)"));
}

#[test]
fn failed_clone_leaves_no_store_behind() {
    let data = assert_fs::TempDir::new().unwrap();
    passync(&data)
        .args(["init", "--no-key", "--mode", "username/password"])
        .assert()
        .success();

    passync(&data)
        .arg("clone")
        .arg(data.path().join("no-such-remote"))
        .write_stdin("pw\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("clone failed"));

    data.child("store").assert(predicate::path::missing());
}

#[test]
fn sync_before_clone_fails() {
    let data = assert_fs::TempDir::new().unwrap();
    passync(&data).args(["init", "--no-key"]).assert().success();

    passync(&data)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password store"));
}

#[test]
fn json_flag_prints_machine_readable_report() {
    let (data, _remote) = cloned_store();

    passync(&data)
        .args(["--json", "sync"])
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"completed\""))
        .stdout(predicate::str::contains("\"commit_skipped\": true"))
        .stdout(predicate::str::contains("passync sync").not());
}

#[test]
fn unstick_saves_conflicting_local_commit_on_a_side_branch() {
    let (data, remote) = cloned_store();
    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("first\n")
        .assert()
        .success();
    passync(&data)
        .arg("sync")
        .write_stdin("pw\n")
        .assert()
        .success();

    push_from_elsewhere(remote.path(), "mail.age", "remote edit", "remote edit");
    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("second\n")
        .assert()
        .success();

    passync(&data)
        .arg("sync")
        .write_stdin("pw\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Rebase stopped on conflicts"));

    passync(&data)
        .arg("unstick")
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("conflicting-master-"));

    let bare = git2::Repository::open_bare(remote.path()).unwrap();
    let side = bare
        .branches(Some(git2::BranchType::Local))
        .unwrap()
        .map(|b| b.unwrap().0)
        .find(|b| b.name().unwrap().unwrap().starts_with("conflicting-master-"))
        .expect("side branch pushed");
    let tip = side.get().peel_to_commit().unwrap();
    assert_eq!(tip.message(), Some("[passync] sync"));

    let saved = tip.tree().unwrap().get_name("mail.age").unwrap().id();
    let local = std::fs::read(data.path().join("store/mail.age")).unwrap();
    assert_eq!(bare.find_blob(saved).unwrap().content(), local.as_slice());
    assert_eq!(remote_head_message(remote.path()), "remote edit");

    passync(&data)
        .args(["show", "mail"])
        .assert()
        .success()
        .stdout("second\n");
}

#[test]
fn rejected_push_points_to_pull_not_reset() {
    let (data, remote) = cloned_store();
    push_from_elsewhere(remote.path(), "other.age", "x", "remote edit");
    commit_file(&data.path().join("store"), "local.age", "y", "local edit");

    passync(&data)
        .arg("push")
        .write_stdin("pw\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Run 'passync pull' first"))
        .stderr(predicate::str::contains("passync reset").not());

    data.child("store/local.age").assert("y");
    assert_eq!(remote_head_message(remote.path()), "remote edit");
}

#[test]
fn pull_with_uncommitted_edit_keeps_it() {
    let (data, remote) = cloned_store();
    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("first\n")
        .assert()
        .success();
    passync(&data)
        .arg("sync")
        .write_stdin("pw\n")
        .assert()
        .success();
    push_from_elsewhere(remote.path(), "mail.age", "remote edit", "remote edit");
    passync(&data)
        .args(["insert", "mail"])
        .write_stdin("draft\n")
        .assert()
        .success();

    passync(&data)
        .arg("pull")
        .write_stdin("pw\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("uncommitted changes"));

    passync(&data)
        .args(["show", "mail"])
        .assert()
        .success()
        .stdout("draft\n");
}
