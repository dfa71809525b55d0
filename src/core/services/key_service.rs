use std::path::PathBuf;

use crate::core::errors::Result;
use crate::core::models::key_pair::KeyPair;
use crate::core::traits::crypto::CryptoEngine;
use crate::core::traits::key_store::KeyStore;

/// Async front for a `KeyStore`.
///
/// Every call runs on tokio's blocking pool so filesystem work never
/// stalls the task that awaits it. The store is cloned into each job;
/// stores are expected to be cheap handles (a path plus an engine).
#[derive(Clone)]
pub struct KeyService<S, C> {
    pub store: S,
    pub engine: C,
}

impl<S, C> KeyService<S, C>
where
    S: KeyStore + Clone + 'static,
    C: CryptoEngine + Clone + 'static,
{
    pub fn new(store: S, engine: C) -> Self {
        Self { store, engine }
    }

    /// Store a key, returning its id.
    pub async fn add_key(&self, key: KeyPair) -> Result<String> {
        self.blocking(move |store, _| store.add(&key)).await
    }

    pub async fn remove_key(&self, key: KeyPair) -> Result<String> {
        self.blocking(move |store, _| store.remove(&key)).await
    }

    pub async fn get_key(&self, id: &str) -> Result<KeyPair> {
        let id = id.to_string();
        self.blocking(move |store, _| store.get_by_id(&id)).await
    }

    pub async fn list_keys(&self) -> Result<Vec<KeyPair>> {
        self.blocking(|store, _| store.get_all()).await
    }

    /// Read a key file, parse it and store it.
    pub async fn import_file(&self, path: PathBuf) -> Result<KeyPair> {
        self.blocking(move |store, engine| {
            let bytes = std::fs::read(&path)?;
            let key = engine.parse_key(&bytes)?;
            store.add(&key)?;
            tracing::info!(key_id = key.id(), source = %path.display(), "key imported");
            Ok(key)
        })
        .await
    }

    /// Generate a fresh key and store it.
    pub async fn generate(&self) -> Result<KeyPair> {
        self.blocking(|store, engine| {
            let key = engine.generate_key()?;
            store.add(&key)?;
            tracing::info!(key_id = key.id(), engine = engine.name(), "key generated");
            Ok(key)
        })
        .await
    }

    async fn blocking<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&S, &C) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || job(&store, &engine)).await?
    }
}
