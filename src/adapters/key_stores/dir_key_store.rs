use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::{PassyncError, Result};
use crate::core::models::key_pair::KeyPair;
use crate::core::traits::crypto::CryptoEngine;
use crate::core::traits::key_store::KeyStore;

/// Name of the key subdirectory under the application data directory.
pub const KEY_DIR_NAME: &str = "keys";

/// Extension of every key file.
pub const KEY_EXTENSION: &str = "key";

static KEY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("static key id pattern")
});

/// Directory-backed key store: one `<id>.key` file per key.
///
/// Layout:
/// ```text
/// <app-data>/keys/
///   3F2A…9C.key      raw private key bytes
///   81D0…47.key
/// ```
///
/// There is no index file; lookups scan the directory and re-derive each
/// key's id from its content.
#[derive(Clone)]
pub struct DirKeyStore<C> {
    key_dir: PathBuf,
    engine: C,
}

impl<C: CryptoEngine> DirKeyStore<C> {
    /// Create a store under `app_data/keys`. Nothing is created on disk yet.
    pub fn new(app_data: &Path, engine: C) -> Self {
        Self {
            key_dir: app_data.join(KEY_DIR_NAME),
            engine,
        }
    }

    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    /// Path of the file holding `id`. Rejects ids that are unsafe as filenames.
    fn key_file(&self, id: &str) -> Result<PathBuf> {
        validate_key_id(id)?;
        Ok(self.key_dir.join(format!("{id}.{KEY_EXTENSION}")))
    }

    fn ensure_dir_exists(&self) -> Result<()> {
        if self.key_dir.is_dir() {
            Ok(())
        } else {
            Err(PassyncError::KeyDirMissing {
                path: self.key_dir.clone(),
            })
        }
    }

    /// Key files in directory-enumeration order.
    fn key_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.key_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| self.can_handle(n)) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn read_key(&self, path: &Path) -> Result<KeyPair> {
        let bytes = std::fs::read(path)?;
        self.engine.parse_key(&bytes).map_err(|e| match e {
            PassyncError::InvalidKey { reason, .. } => PassyncError::InvalidKey {
                origin: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// Check that a key id can be used verbatim as a file stem.
pub fn validate_key_id(id: &str) -> Result<()> {
    if KEY_ID.is_match(id) {
        Ok(())
    } else {
        Err(PassyncError::InvalidKeyId { id: id.to_string() })
    }
}

impl<C: CryptoEngine> KeyStore for DirKeyStore<C> {
    fn add(&self, key: &KeyPair) -> Result<String> {
        let path = self.key_file(key.id())?;

        std::fs::create_dir_all(&self.key_dir).map_err(|source| PassyncError::KeyDirCreate {
            path: self.key_dir.clone(),
            source,
        })?;

        // Write next to the target, then swap it in: a crash never leaves a
        // half-written key, and re-adding replaces the old file.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.key_dir)?;
        tmp.write_all(key.private_key())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| PassyncError::Io(e.error))?;

        tracing::debug!(key_id = key.id(), path = %path.display(), "key stored");
        Ok(key.id().to_string())
    }

    fn remove(&self, key: &KeyPair) -> Result<String> {
        self.ensure_dir_exists()?;
        let path = self.key_file(key.id())?;

        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| PassyncError::KeyDelete {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(key_id = key.id(), "key removed");
        }

        Ok(key.id().to_string())
    }

    fn get_by_id(&self, id: &str) -> Result<KeyPair> {
        self.ensure_dir_exists()?;

        let files = self.key_files()?;
        if files.is_empty() {
            return Err(PassyncError::KeyDirEmpty {
                path: self.key_dir.clone(),
            });
        }

        for file in &files {
            let key = self.read_key(file)?;
            if key.id() == id {
                return Ok(key);
            }
        }

        Err(PassyncError::KeyNotFound { id: id.to_string() })
    }

    fn get_all(&self) -> Result<Vec<KeyPair>> {
        self.ensure_dir_exists()?;
        self.key_files()?
            .iter()
            .map(|file| self.read_key(file))
            .collect()
    }

    fn can_handle(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(KEY_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::age_engine::AgeEngine;

    fn temp_store() -> (tempfile::TempDir, DirKeyStore<AgeEngine>) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirKeyStore::new(dir.path(), AgeEngine);
        (dir, store)
    }

    fn sample_key() -> KeyPair {
        AgeEngine.generate_key().unwrap()
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn add_creates_directory_and_named_file() {
        let (_dir, store) = temp_store();
        let key = sample_key();

        let id = store.add(&key).unwrap();

        assert_eq!(id, key.id());
        let expected = store.key_dir().join(format!("{id}.key"));
        assert_eq!(std::fs::read(expected).unwrap(), key.private_key());
    }

    #[test]
    fn add_same_id_twice_keeps_one_file_with_latest_content() {
        let (_dir, store) = temp_store();
        let key = sample_key();
        store.add(&key).unwrap();

        // Same identity, different bytes (extra comment line).
        let mut rewritten = b"# rotated copy\n".to_vec();
        rewritten.extend_from_slice(key.private_key());
        let second = AgeEngine.parse_key(&rewritten).unwrap();
        assert_eq!(second.id(), key.id());
        store.add(&second).unwrap();

        let files = files_in(store.key_dir());
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read(&files[0]).unwrap(), rewritten);
    }

    #[test]
    fn add_fails_when_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let store = DirKeyStore::new(&blocker, AgeEngine);
        let err = store.add(&sample_key()).unwrap_err();
        assert!(matches!(err, PassyncError::KeyDirCreate { .. }));
    }

    #[test]
    fn add_rejects_unsafe_id() {
        let (_dir, store) = temp_store();
        let key = KeyPair::new("../escape".into(), b"x".to_vec(), None);
        let err = store.add(&key).unwrap_err();
        assert!(matches!(err, PassyncError::InvalidKeyId { .. }));
        assert!(!store.key_dir().exists());
    }

    #[test]
    fn remove_then_get_by_id_fails() {
        let (_dir, store) = temp_store();
        let key = sample_key();
        let other = sample_key();
        store.add(&key).unwrap();
        store.add(&other).unwrap();

        assert_eq!(store.remove(&key).unwrap(), key.id());

        let err = store.get_by_id(key.id()).unwrap_err();
        assert!(matches!(err, PassyncError::KeyNotFound { .. }));
    }

    #[test]
    fn remove_absent_key_is_noop_success() {
        let (_dir, store) = temp_store();
        store.add(&sample_key()).unwrap();

        let absent = sample_key();
        assert_eq!(store.remove(&absent).unwrap(), absent.id());
    }

    #[test]
    fn get_all_on_empty_directory_returns_empty() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.key_dir()).unwrap();

        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn get_by_id_on_empty_directory_fails() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.key_dir()).unwrap();

        let err = store.get_by_id("ABC").unwrap_err();
        assert!(matches!(err, PassyncError::KeyDirEmpty { .. }));
    }

    #[test]
    fn operations_before_directory_exists_fail() {
        let (_dir, store) = temp_store();
        let key = sample_key();

        assert!(matches!(
            store.get_all().unwrap_err(),
            PassyncError::KeyDirMissing { .. }
        ));
        assert!(matches!(
            store.get_by_id(key.id()).unwrap_err(),
            PassyncError::KeyDirMissing { .. }
        ));
        assert!(matches!(
            store.remove(&key).unwrap_err(),
            PassyncError::KeyDirMissing { .. }
        ));
    }

    #[test]
    fn get_all_returns_every_key_and_ignores_foreign_files() {
        let (_dir, store) = temp_store();
        let a = sample_key();
        let b = sample_key();
        store.add(&a).unwrap();
        store.add(&b).unwrap();
        std::fs::write(store.key_dir().join("notes.txt"), "not a key").unwrap();

        let mut ids: Vec<_> = store
            .get_all()
            .unwrap()
            .iter()
            .map(|k| k.id().to_string())
            .collect();
        ids.sort();
        let mut expected = vec![a.id().to_string(), b.id().to_string()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn corrupt_key_file_is_reported_with_its_path() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.key_dir()).unwrap();
        std::fs::write(store.key_dir().join("BROKEN.key"), "garbage").unwrap();

        match store.get_all().unwrap_err() {
            PassyncError::InvalidKey { origin, .. } => assert!(origin.ends_with("BROKEN.key")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn can_handle_matches_key_extension_only() {
        let (_dir, store) = temp_store();
        assert!(store.can_handle("ABC.key"));
        assert!(store.can_handle("ABC.KEY"));
        assert!(!store.can_handle("ABC.asc"));
        assert!(!store.can_handle("key"));
    }

    #[test]
    fn validate_key_id_rejects_path_tricks() {
        assert!(validate_key_id("3F2A9C").is_ok());
        assert!(validate_key_id("my-key_1.v2").is_ok());
        assert!(validate_key_id("").is_err());
        assert!(validate_key_id("..").is_err());
        assert!(validate_key_id("a/b").is_err());
        assert!(validate_key_id(&"A".repeat(129)).is_err());
    }
}
