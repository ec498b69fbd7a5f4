//! Shared test utilities for authentication testing.
//!
//! This module provides common helpers for generating key pairs, building
//! in-memory key stores, signing arbitrary payloads, and crafting raw token
//! strings (for attack testing). It is feature-gated behind `testutil` to
//! prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! warden-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use warden_authn::testutil::{key_store, test_key};
//! ```

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Header};
use warden_keystore::{GeneratedKeyPair, KeyStore, MemoryKeySource};

/// Generates a fresh Ed25519 key pair for `kid`.
///
/// # Panics
///
/// Panics if `kid` is not a valid key identifier.
pub fn test_key(kid: &str) -> GeneratedKeyPair {
    GeneratedKeyPair::generate(kid).expect("Failed to generate test key pair")
}

/// Builds a key source holding the private half of each `signing` key and
/// the public half of each `public_only` key, as `<kid>.pem` files.
pub fn memory_source(
    signing: &[&GeneratedKeyPair],
    public_only: &[&GeneratedKeyPair],
) -> MemoryKeySource {
    let mut source = MemoryKeySource::new();
    for key in signing {
        source.insert(key.file_name(), key.private_pem());
    }
    for key in public_only {
        source.insert(key.file_name(), key.public_pem());
    }
    source
}

/// Loads a shared key store from [`memory_source`].
///
/// # Panics
///
/// Panics if the store fails to load (e.g. a `kid` appears twice).
pub fn key_store(
    signing: &[&GeneratedKeyPair],
    public_only: &[&GeneratedKeyPair],
) -> Arc<KeyStore> {
    let store = KeyStore::load(&memory_source(signing, public_only))
        .expect("Failed to load test key store");
    Arc::new(store)
}

/// Signs an arbitrary JSON payload with the private key `kid` from `store`.
///
/// The header is `{"typ": "JWT", "alg": "EdDSA", "kid": kid}`. Use this to
/// produce correctly signed tokens whose claims the authority itself would
/// never issue (missing `exp`, foreign issuers, odd types).
///
/// # Panics
///
/// Panics if `store` has no private key for `kid` or encoding fails.
pub fn sign_payload(store: &KeyStore, kid: &str, payload: &serde_json::Value) -> String {
    let key = store.private_key(kid).expect("test key has no private half");

    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(kid.to_owned());

    jsonwebtoken::encode(&header, payload, key).expect("Failed to encode test token")
}

/// Creates a raw token string from arbitrary header and payload JSON.
///
/// The resulting token has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack tokens (e.g., `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}

/// Asserts that a [`Result<T, AuthError>`] is an `Err` matching the given [`AuthError`] variant.
///
/// Works with any `AuthError` variant. On failure, prints the expected variant
/// and the actual result for debugging.
///
/// [`AuthError`]: crate::error::AuthError
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use warden_authn::assert_auth_error;
/// use warden_authn::error::AuthError;
///
/// let result: Result<(), AuthError> = Err(AuthError::token_expired());
/// assert_auth_error!(result, TokenExpired);
/// ```
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "expected AuthError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "{}: expected AuthError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}
