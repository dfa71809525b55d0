use crate::core::errors::Result;
use crate::core::models::key_pair::KeyPair;

/// Port for durable key-pair storage.
///
/// Implementations perform blocking I/O and no internal locking; callers
/// serialize access to the same id and run calls off the foreground
/// (see `KeyService`).
pub trait KeyStore: Send + Sync {
    /// Persist a key, replacing any stored copy with the same id.
    fn add(&self, key: &KeyPair) -> Result<String>;

    /// Delete a stored key. Succeeds when it is already absent.
    fn remove(&self, key: &KeyPair) -> Result<String>;

    /// Find the stored key whose derived id equals `id`.
    fn get_by_id(&self, id: &str) -> Result<KeyPair>;

    /// Every stored key. Empty when the store has no keys yet.
    fn get_all(&self) -> Result<Vec<KeyPair>>;

    /// Whether a file with this name belongs to this store's key format.
    fn can_handle(&self, file_name: &str) -> bool;
}
