/// One asymmetric credential usable for encrypt/decrypt.
///
/// The `id` is derived from the key material by a `CryptoEngine` and
/// never changes afterwards. Instances are plain values: the key store
/// owns the on-disk copy and hands out clones on read.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    id: String,
    private_key: Vec<u8>,
    public_key: Option<Vec<u8>>,
}

impl KeyPair {
    /// Build a key pair from material and the id its engine derived from it.
    pub fn new(id: String, private_key: Vec<u8>, public_key: Option<Vec<u8>>) -> Self {
        Self {
            id,
            private_key,
            public_key,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }

    /// Public material as text, when it is valid UTF-8.
    pub fn public_key_str(&self) -> Option<&str> {
        self.public_key
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("id", &self.id)
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key_str())
            .finish()
    }
}

impl std::fmt::Display for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.public_key_str() {
            Some(public) => write!(f, "{} ({})", self.id, public),
            None => write!(f, "{}", self.id),
        }
    }
}
