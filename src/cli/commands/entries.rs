use std::io::{self, Read, Write};
use std::path::Path;

use crate::adapters::crypto::age_engine::AgeEngine;
use crate::adapters::key_stores::dir_key_store::DirKeyStore;
use crate::cli::{block_on, output};
use crate::config::app_config::AppConfig;
use crate::core::errors::{PassyncError, Result};
use crate::core::services::encryption_service::EncryptionService;

fn service(data_dir: &Path) -> EncryptionService<DirKeyStore<AgeEngine>, AgeEngine> {
    EncryptionService::new(DirKeyStore::new(data_dir, AgeEngine), AgeEngine)
}

/// Execute `passync insert <name>`: encrypt stdin into the store.
pub fn insert(data_dir: &Path, name: &str) -> Result<i32> {
    let config = AppConfig::load(data_dir)?;
    let store_dir = config.store_dir(data_dir);

    let mut secret = Vec::new();
    io::stdin().lock().read_to_end(&mut secret)?;
    while secret.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
        secret.pop();
    }
    if secret.is_empty() {
        return Err(PassyncError::EncryptionFailed {
            reason: "nothing to encrypt: stdin was empty".into(),
        });
    }

    let path = block_on(service(data_dir).encrypt_entry(&store_dir, name, secret))??;
    output::success(&format!("Encrypted {name} to {}", path.display()));
    println!("  Run 'passync sync' to share it.");
    Ok(0)
}

/// Execute `passync show <name>`: print the decrypted entry on stdout.
pub fn show(data_dir: &Path, name: &str) -> Result<i32> {
    let config = AppConfig::load(data_dir)?;
    let store_dir = config.store_dir(data_dir);

    let plaintext = block_on(service(data_dir).decrypt_entry(&store_dir, name))??;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.write_all(b"\n")?;
    Ok(0)
}
