//! # Warden Key Store
//!
//! Loads Ed25519 signing and verification keys from PEM files and serves them
//! by key identifier (`kid`).
//!
//! This crate provides:
//! - **Key store**: An immutable `kid` → key material map built once at startup
//! - **Key sources**: Directory and in-memory collections of PEM key files
//! - **Key generation**: Fresh Ed25519 pairs written as PKCS#8 / SPKI PEM
//!
//! ## Key files
//!
//! Each `<kid>.pem` file holds exactly one key. A `PRIVATE KEY` file makes
//! `kid` usable for both signing and verification; a `PUBLIC KEY` file makes
//! it usable for verification only. Loading is all-or-nothing: one bad file
//! fails the whole load.
//!
//! ## Example
//!
//! ```no_run
//! use warden_keystore::KeyStore;
//!
//! # fn example() -> Result<(), warden_keystore::KeyStoreError> {
//! let store = KeyStore::load_dir("/etc/warden/keys")?;
//! for kid in store.kids() {
//!     println!("{kid}: signing={}", store.has_private_key(kid));
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Key store error types.
pub mod error;
/// Operator key generation.
pub mod keygen;
/// Key identifier rules.
pub mod kid;
/// Key file sources.
pub mod source;
/// The key store.
pub mod store;

pub use error::{KeyStoreError, Result};
pub use keygen::GeneratedKeyPair;
pub use kid::{MAX_KID_LENGTH, validate_kid};
pub use source::{
    DirKeySource, KEY_FILE_EXTENSION, KeyFile, KeySource, MAX_KEY_FILE_SIZE, MemoryKeySource,
};
pub use store::{KeyPairEntry, KeyStore};
