use std::io::{Read, Write};

use age::secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::core::errors::{PassyncError, Result};
use crate::core::models::key_pair::KeyPair;
use crate::core::traits::crypto::CryptoEngine;

/// Number of digest bytes kept in a key id (same width as an OpenPGP v4
/// fingerprint).
const FINGERPRINT_BYTES: usize = 20;

/// Age engine using X25519 + ChaCha20-Poly1305.
///
/// Key files hold an `AGE-SECRET-KEY-1…` line, optionally preceded by
/// `#` comments. Entries are ASCII-armored so they diff cleanly in Git.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeEngine;

impl AgeEngine {
    /// Stable id for a public recipient: upper-case hex of its SHA-256, truncated.
    pub fn fingerprint(recipient: &str) -> String {
        let digest = Sha256::digest(recipient.as_bytes());
        digest[..FINGERPRINT_BYTES]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect()
    }

    fn parse_identity(bytes: &[u8]) -> Result<age::x25519::Identity> {
        let text = std::str::from_utf8(bytes).map_err(|_| invalid_key("key is not UTF-8 text"))?;

        text.lines()
            .map(str::trim)
            .find(|l| l.starts_with("AGE-SECRET-KEY-"))
            .ok_or_else(|| invalid_key("no AGE-SECRET-KEY line found"))?
            .parse()
            .map_err(|e: &str| invalid_key(e))
    }

    fn parse_recipients(keys: &[KeyPair]) -> Result<Vec<age::x25519::Recipient>> {
        keys.iter()
            .map(|key| {
                let public = key
                    .public_key_str()
                    .ok_or_else(|| PassyncError::EncryptionFailed {
                        reason: format!("Key '{}' has no public part", key.id()),
                    })?;
                public
                    .parse::<age::x25519::Recipient>()
                    .map_err(|e: &str| PassyncError::EncryptionFailed {
                        reason: format!("Invalid recipient '{public}': {e}"),
                    })
            })
            .collect()
    }
}

fn invalid_key(reason: &str) -> PassyncError {
    PassyncError::InvalidKey {
        origin: "key material".into(),
        reason: reason.to_string(),
    }
}

impl CryptoEngine for AgeEngine {
    fn parse_key(&self, bytes: &[u8]) -> Result<KeyPair> {
        let identity = Self::parse_identity(bytes)?;
        let recipient = identity.to_public().to_string();

        Ok(KeyPair::new(
            Self::fingerprint(&recipient),
            bytes.to_vec(),
            Some(recipient.into_bytes()),
        ))
    }

    fn generate_key(&self) -> Result<KeyPair> {
        let identity = age::x25519::Identity::generate();
        let public_key = identity.to_public().to_string();

        let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let contents = format!(
            "# created: {created}\n# public key: {public_key}\n{}\n",
            identity.to_string().expose_secret()
        );

        self.parse_key(contents.as_bytes())
    }

    fn encrypt(&self, plaintext: &[u8], recipients: &[KeyPair]) -> Result<Vec<u8>> {
        if recipients.is_empty() {
            return Err(PassyncError::EncryptionFailed {
                reason: "No recipients provided".into(),
            });
        }

        let parsed = Self::parse_recipients(recipients)?;

        let encryptor =
            age::Encryptor::with_recipients(parsed.iter().map(|r| r as &dyn age::Recipient))
                .map_err(|e| PassyncError::EncryptionFailed {
                    reason: format!("{e}"),
                })?;

        let mut output = Vec::new();
        let armored =
            age::armor::ArmoredWriter::wrap_output(&mut output, age::armor::Format::AsciiArmor)
                .map_err(|e| PassyncError::EncryptionFailed {
                    reason: format!("Armor writer failed: {e}"),
                })?;

        let mut writer =
            encryptor
                .wrap_output(armored)
                .map_err(|e| PassyncError::EncryptionFailed {
                    reason: format!("Encryption stream failed: {e}"),
                })?;

        writer
            .write_all(plaintext)
            .map_err(|e| PassyncError::EncryptionFailed {
                reason: format!("Write failed: {e}"),
            })?;

        writer
            .finish()
            .and_then(|armored| armored.finish())
            .map_err(|e| PassyncError::EncryptionFailed {
                reason: format!("Encryption finish failed: {e}"),
            })?;

        Ok(output)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
        let identity = Self::parse_identity(key.private_key())?;

        let decryptor = age::Decryptor::new(age::armor::ArmoredReader::new(ciphertext))
            .map_err(|e| PassyncError::DecryptionFailed {
                reason: format!("Invalid encrypted entry: {e}"),
            })?;

        let mut reader = decryptor
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| PassyncError::DecryptionFailed {
                reason: e.to_string(),
            })?;

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| PassyncError::DecryptionFailed {
                reason: format!("Read decrypted data failed: {e}"),
            })?;

        Ok(plaintext)
    }

    fn name(&self) -> &str {
        "age"
    }
}
