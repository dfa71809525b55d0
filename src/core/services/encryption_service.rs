use std::path::{Component, Path, PathBuf};

use crate::core::errors::{PassyncError, Result};
use crate::core::traits::crypto::CryptoEngine;
use crate::core::traits::key_store::KeyStore;

/// Extension of encrypted password entries in the store work tree.
pub const ENTRY_EXTENSION: &str = "age";

/// Encrypts and decrypts password entries with the keys of a `KeyStore`.
///
/// Entries are opaque blobs at `<store>/<name>.age`, encrypted to every
/// stored key so any device holding one of them can read it.
#[derive(Clone)]
pub struct EncryptionService<S, C> {
    pub store: S,
    pub engine: C,
}

impl<S, C> EncryptionService<S, C>
where
    S: KeyStore + Clone + 'static,
    C: CryptoEngine + Clone + 'static,
{
    pub fn new(store: S, engine: C) -> Self {
        Self { store, engine }
    }

    /// Encrypt `plaintext` to all stored keys and write the entry.
    pub async fn encrypt_entry(
        &self,
        store_root: &Path,
        name: &str,
        plaintext: Vec<u8>,
    ) -> Result<PathBuf> {
        let path = entry_path(store_root, name)?;
        let (store, engine) = (self.store.clone(), self.engine.clone());

        tokio::task::spawn_blocking(move || {
            let recipients = store.get_all()?;
            let ciphertext = engine.encrypt(&plaintext, &recipients)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, ciphertext)?;
            tracing::info!(entry = %path.display(), recipients = recipients.len(), "entry encrypted");
            Ok(path)
        })
        .await?
    }

    /// Decrypt an entry with the first stored key that opens it.
    pub async fn decrypt_entry(&self, store_root: &Path, name: &str) -> Result<Vec<u8>> {
        let path = entry_path(store_root, name)?;
        let (store, engine) = (self.store.clone(), self.engine.clone());

        tokio::task::spawn_blocking(move || {
            if !path.is_file() {
                return Err(PassyncError::EntryNotFound { path });
            }
            let ciphertext = std::fs::read(&path)?;

            let mut last_error = None;
            for key in store.get_all()? {
                match engine.decrypt(&ciphertext, &key) {
                    Ok(plaintext) => {
                        tracing::debug!(entry = %path.display(), key_id = key.id(), "entry decrypted");
                        return Ok(plaintext);
                    }
                    Err(e) => last_error = Some(e),
                }
            }
            Err(last_error.unwrap_or_else(|| PassyncError::DecryptionFailed {
                reason: "no keys stored".into(),
            }))
        })
        .await?
    }
}

/// Map an entry name like `email/work` to its file, refusing anything that
/// would escape the store.
pub fn entry_path(store_root: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let well_formed = !name.trim().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !well_formed {
        return Err(PassyncError::InvalidEntryName {
            name: name.to_string(),
        });
    }
    Ok(store_root.join(format!("{name}.{ENTRY_EXTENSION}")))
}
