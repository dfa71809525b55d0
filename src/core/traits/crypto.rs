use crate::core::errors::Result;
use crate::core::models::key_pair::KeyPair;

/// Port for the encryption engine behind password entries.
///
/// Implementations live in `adapters::crypto`. The core layer only depends
/// on this trait, never on a concrete engine.
pub trait CryptoEngine: Send + Sync {
    /// Parse raw key material, deriving its stable id.
    fn parse_key(&self, bytes: &[u8]) -> Result<KeyPair>;

    /// Create fresh key material.
    fn generate_key(&self) -> Result<KeyPair>;

    /// Encrypt an entry for every given key.
    fn encrypt(&self, plaintext: &[u8], recipients: &[KeyPair]) -> Result<Vec<u8>>;

    /// Decrypt an entry with one private key.
    fn decrypt(&self, ciphertext: &[u8], key: &KeyPair) -> Result<Vec<u8>>;

    /// Human-readable name of this engine (e.g. "age").
    fn name(&self) -> &str;
}
