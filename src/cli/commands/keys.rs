use std::path::Path;

use crate::adapters::crypto::age_engine::AgeEngine;
use crate::adapters::key_stores::dir_key_store::DirKeyStore;
use crate::cli::{KeysAction, block_on, output};
use crate::core::errors::Result;
use crate::core::services::key_service::KeyService;

type Keys = KeyService<DirKeyStore<AgeEngine>, AgeEngine>;

/// Execute the `passync keys` command.
pub fn execute(data_dir: &Path, action: &KeysAction) -> Result<i32> {
    let keys = KeyService::new(DirKeyStore::new(data_dir, AgeEngine), AgeEngine);
    block_on(async {
        match action {
            KeysAction::Import { file } => import(&keys, file).await,
            KeysAction::Generate => generate(&keys).await,
            KeysAction::List => list(&keys).await,
            KeysAction::Show { id } => show(&keys, id).await,
            KeysAction::Remove { id } => remove(&keys, id).await,
        }
    })??;
    Ok(0)
}

async fn import(keys: &Keys, file: &Path) -> Result<()> {
    let key = keys.import_file(file.to_path_buf()).await?;
    output::success(&format!("Imported key {}", key.id()));
    Ok(())
}

async fn generate(keys: &Keys) -> Result<()> {
    let key = keys.generate().await?;
    output::success(&format!("Generated key {}", key.id()));
    if let Some(public) = key.public_key_str() {
        output::success(&format!("Public key: {public}"));
    }
    Ok(())
}

async fn list(keys: &Keys) -> Result<()> {
    let all = keys.list_keys().await?;
    if all.is_empty() {
        output::warning("No keys stored. Run 'passync keys generate'.");
        return Ok(());
    }

    output::header(&format!("Keys ({})", all.len()));
    for key in &all {
        output::key_line(key.id(), key.public_key_str());
    }
    Ok(())
}

async fn show(keys: &Keys, id: &str) -> Result<()> {
    let key = keys.get_key(id).await?;
    output::key_line(key.id(), key.public_key_str());
    Ok(())
}

async fn remove(keys: &Keys, id: &str) -> Result<()> {
    let key = keys.get_key(id).await?;
    let removed = keys.remove_key(key).await?;
    output::success(&format!("Removed key {removed}"));
    Ok(())
}
