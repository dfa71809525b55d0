use std::path::Path;

use crate::adapters::crypto::age_engine::AgeEngine;
use crate::adapters::key_stores::dir_key_store::{DirKeyStore, KEY_DIR_NAME};
use crate::cli::output;
use crate::config::app_config::{AppConfig, CONFIG_FILE};
use crate::core::errors::{PassyncError, Result};
use crate::core::models::credential::ConnectionMode;
use crate::core::services::key_service::KeyService;

/// Execute the `passync init` command.
///
/// Creates the data directory with a default `config.toml` and, unless
/// `no_key` is set, generates a first encryption key.
pub fn execute(data_dir: &Path, mode: &str, username: &str, no_key: bool) -> Result<i32> {
    if data_dir.join(CONFIG_FILE).exists() {
        return Err(PassyncError::InvalidConfig {
            detail: format!(
                "passync is already initialized in {}",
                data_dir.display()
            ),
        });
    }

    output::header("passync: initializing");

    let mut config = AppConfig::default();
    config.connection.mode = ConnectionMode::parse(mode).as_str().to_string();
    config.connection.username = username.to_string();
    config.save(data_dir)?;
    output::success(&format!("Wrote {}", data_dir.join(CONFIG_FILE).display()));

    if no_key {
        output::warning("Skipped key generation");
        println!("  Run 'passync keys generate' or 'passync keys import <file>' later.\n");
        return Ok(0);
    }

    let keys = KeyService::new(DirKeyStore::new(data_dir, AgeEngine), AgeEngine);
    let key = crate::cli::block_on(keys.generate())??;
    output::success(&format!(
        "Generated key {} in {}/",
        key.id(),
        data_dir.join(KEY_DIR_NAME).display()
    ));
    if let Some(public) = key.public_key_str() {
        output::success(&format!("Public key: {public}"));
    }

    println!("\n  Next: passync clone <url>\n");
    Ok(0)
}
