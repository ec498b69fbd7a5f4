//! The immutable key store.
//!
//! A [`KeyStore`] is built once from a [`KeySource`] and never changes
//! afterwards. Each key file becomes one [`KeyPairEntry`]:
//!
//! ```text
//! k1.pem  (PRIVATE KEY) ──► entry "k1": signing + verification
//! k0.pem  (PUBLIC KEY)  ──► entry "k0": verification only
//! ```
//!
//! Rotation happens by redeploying with a new file set: keep the public half
//! of a retired key for as long as its tokens may still be presented, then
//! drop the file. Lookups are plain map reads and need no locking.

use std::collections::{HashMap, hash_map::Entry};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{
    SigningKey, VerifyingKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, KeypairBytes, SecretDocument},
};
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::{
    error::{KeyStoreError, Result},
    source::{DirKeySource, KeyFile, KeySource},
};

/// PEM label of a PKCS#8 private key.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// PEM label of an SPKI public key.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// One key identifier's material.
///
/// Always holds the public half; holds the private half only when the file
/// carried a private key.
pub struct KeyPairEntry {
    kid: String,
    file: String,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    verifying_key: VerifyingKey,
}

impl KeyPairEntry {
    fn from_signing_key(kid: &str, file: &str, signing_key: &SigningKey) -> Result<Self> {
        let der = pkcs8_v1_der(signing_key, file)?;
        let mut entry = Self::from_verifying_key(kid, file, signing_key.verifying_key())?;
        entry.encoding_key = Some(EncodingKey::from_ed_der(der.as_bytes()));
        Ok(entry)
    }

    fn from_verifying_key(kid: &str, file: &str, verifying_key: VerifyingKey) -> Result<Self> {
        let x = URL_SAFE_NO_PAD.encode(verifying_key.as_bytes());
        let decoding_key = DecodingKey::from_ed_components(&x)
            .map_err(|e| KeyStoreError::key_load_with_source(file, "invalid public key", e))?;

        Ok(Self {
            kid: kid.to_owned(),
            file: file.to_owned(),
            encoding_key: None,
            decoding_key,
            verifying_key,
        })
    }

    /// The key identifier.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Name of the file this entry was loaded from.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Whether this entry can sign.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// The raw Ed25519 verification key.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl std::fmt::Debug for KeyPairEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairEntry")
            .field("kid", &self.kid)
            .field("file", &self.file)
            .field("has_private_key", &self.has_private_key())
            .finish_non_exhaustive()
    }
}

/// Read-only mapping from key identifier to key material.
///
/// # Examples
///
/// ```
/// use warden_keystore::{GeneratedKeyPair, KeyStore, MemoryKeySource};
///
/// let pair = GeneratedKeyPair::generate("k1")?;
/// let source = MemoryKeySource::new().with_file("k1.pem", pair.private_pem());
/// let store = KeyStore::load(&source)?;
///
/// assert!(store.private_key("k1").is_ok());
/// assert!(store.public_key("k1").is_ok());
/// assert!(store.public_key("k2").is_err());
/// # Ok::<(), warden_keystore::KeyStoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct KeyStore {
    entries: HashMap<String, KeyPairEntry>,
}

impl KeyStore {
    /// Builds a store from every key file in `source`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyLoad`] if any file is unreadable, is not a
    /// single Ed25519 PEM key, has a name that is not a valid `kid`, or
    /// declares a `kid` another file already declared. No partial store is
    /// returned.
    #[tracing::instrument(skip(source), fields(source = %source.describe()))]
    pub fn load<S: KeySource + ?Sized>(source: &S) -> Result<Self> {
        let files = source.key_files()?;

        let mut entries: HashMap<String, KeyPairEntry> = HashMap::with_capacity(files.len());
        for file in &files {
            let entry = parse_key_file(file)?;
            match entries.entry(entry.kid.clone()) {
                Entry::Occupied(existing) => {
                    return Err(KeyStoreError::key_load(
                        file.name(),
                        format!(
                            "duplicate key id '{}' (already loaded from '{}')",
                            entry.kid,
                            existing.get().file
                        ),
                    ));
                },
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                },
            }
        }

        let store = Self { entries };
        tracing::info!(
            keys = store.len(),
            signing_keys = store.entries.values().filter(|e| e.has_private_key()).count(),
            "key store loaded"
        );
        Ok(store)
    }

    /// Builds a store from the `.pem` files at the top level of `dir`.
    ///
    /// # Errors
    ///
    /// See [`KeyStore::load`].
    pub fn load_dir(dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Self::load(&DirKeySource::new(dir))
    }

    /// Returns the signing key for `kid`.
    ///
    /// # Errors
    ///
    /// - [`KeyStoreError::KeyNotFound`] if `kid` is unknown
    /// - [`KeyStoreError::NoPrivateMaterial`] if only the public half is held
    pub fn private_key(&self, kid: &str) -> Result<&EncodingKey> {
        self.get(kid)?
            .encoding_key
            .as_ref()
            .ok_or_else(|| KeyStoreError::no_private_material(kid))
    }

    /// Returns the verification key for `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyNotFound`] if `kid` is unknown.
    pub fn public_key(&self, kid: &str) -> Result<&DecodingKey> {
        Ok(&self.get(kid)?.decoding_key)
    }

    /// Returns the raw Ed25519 verification key for `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyNotFound`] if `kid` is unknown.
    pub fn verifying_key(&self, kid: &str) -> Result<&VerifyingKey> {
        Ok(&self.get(kid)?.verifying_key)
    }

    /// Returns the entry for `kid`, if any.
    #[must_use]
    pub fn entry(&self, kid: &str) -> Option<&KeyPairEntry> {
        self.entries.get(kid)
    }

    /// Whether an entry exists for `kid`.
    #[must_use]
    pub fn contains(&self, kid: &str) -> bool {
        self.entries.contains_key(kid)
    }

    /// Whether `kid` exists and can sign.
    #[must_use]
    pub fn has_private_key(&self, kid: &str) -> bool {
        self.entries.get(kid).is_some_and(KeyPairEntry::has_private_key)
    }

    /// All key identifiers, sorted.
    #[must_use]
    pub fn kids(&self) -> Vec<&str> {
        let mut kids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        kids.sort_unstable();
        kids
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, kid: &str) -> Result<&KeyPairEntry> {
        self.entries.get(kid).ok_or_else(|| KeyStoreError::key_not_found(kid))
    }
}

fn parse_key_file(file: &KeyFile) -> Result<KeyPairEntry> {
    let kid = file.kid()?;
    let name = file.name();

    let mut blocks = pem::parse_many(file.contents())
        .map_err(|e| KeyStoreError::key_load_with_source(name, "malformed PEM", e))?;
    if blocks.is_empty() {
        return Err(KeyStoreError::key_load(name, "malformed PEM: no PEM block found"));
    }
    if blocks.len() > 1 {
        return Err(KeyStoreError::key_load(name, "expected exactly one PEM block"));
    }
    let block = blocks.swap_remove(0);

    match block.tag() {
        PRIVATE_KEY_LABEL => {
            let signing_key = SigningKey::from_pkcs8_der(block.contents()).map_err(|e| {
                KeyStoreError::key_load(name, format!("invalid Ed25519 private key: {e}"))
            })?;
            KeyPairEntry::from_signing_key(kid, name, &signing_key)
        },
        PUBLIC_KEY_LABEL => {
            let verifying_key = VerifyingKey::from_public_key_der(block.contents()).map_err(|e| {
                KeyStoreError::key_load(name, format!("invalid Ed25519 public key: {e}"))
            })?;
            KeyPairEntry::from_verifying_key(kid, name, verifying_key)
        },
        other => Err(KeyStoreError::key_load(name, format!("unsupported key type '{other}'"))),
    }
}

/// Re-encodes a signing key as a PKCS#8 v1 document (no embedded public
/// key), the form the JOSE signer accepts regardless of how the source file
/// was encoded.
fn pkcs8_v1_der(signing_key: &SigningKey, file: &str) -> Result<SecretDocument> {
    KeypairBytes { secret_key: signing_key.to_bytes(), public_key: None }
        .to_pkcs8_der()
        .map_err(|e| KeyStoreError::key_load(file, format!("private key re-encoding: {e}")))
}
