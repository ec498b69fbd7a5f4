//! Key store error types and result alias.
//!
//! Errors split along the store's lifecycle:
//!
//! - **Load time**: [`KeyStoreError::KeyLoad`] is fatal. A process that cannot build its key store
//!   must refuse to start.
//! - **Lookup time**: [`KeyStoreError::KeyNotFound`] and [`KeyStoreError::NoPrivateMaterial`] are
//!   narrow, per-request failures (e.g. a token referencing a retired key).
//! - **Administration**: [`KeyStoreError::KeyGeneration`] and [`KeyStoreError::KeyWrite`] come
//!   from the operator-triggered key generation path only.

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

/// A shared boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for key store operations.
pub type Result<T> = std::result::Result<T, KeyStoreError>;

/// Errors produced while loading, querying, or generating keys.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeyStoreError {
    /// A key file could not be read, parsed, or admitted into the store.
    ///
    /// Covers unreadable files, malformed PEM, unsupported key types,
    /// invalid key identifiers, and duplicate key identifiers.
    #[error("Failed to load key file '{file}': {message}")]
    KeyLoad {
        /// Name of the offending file (or the source root for listing errors).
        file: String,
        /// Description of the failure.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<BoxError>,
    },

    /// No entry exists for the requested key identifier.
    #[error("Key not found: {kid}")]
    KeyNotFound {
        /// Key ID that was not found.
        kid: String,
    },

    /// The entry exists but only holds the public half.
    #[error("No private key material for key: {kid}")]
    NoPrivateMaterial {
        /// Key ID that has no private half.
        kid: String,
    },

    /// A key identifier does not satisfy the identifier format.
    #[error("Invalid key id '{kid}': {reason}")]
    InvalidKeyId {
        /// The rejected identifier.
        kid: String,
        /// Which rule the identifier broke.
        reason: &'static str,
    },

    /// Key pair generation or PEM encoding failed.
    #[error("Key generation failed: {message}")]
    KeyGeneration {
        /// Description of the failure.
        message: String,
    },

    /// A generated key file could not be written.
    #[error("Failed to write key file '{}'", path.display())]
    KeyWrite {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl KeyStoreError {
    /// Creates a new `KeyLoad` error for the given file.
    #[must_use]
    pub fn key_load(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KeyLoad { file: file.into(), message: message.into(), source: None }
    }

    /// Creates a new `KeyLoad` error with a source error.
    #[must_use]
    pub fn key_load_with_source(
        file: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::KeyLoad { file: file.into(), message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `NoPrivateMaterial` error.
    #[must_use]
    pub fn no_private_material(kid: impl Into<String>) -> Self {
        Self::NoPrivateMaterial { kid: kid.into() }
    }

    /// Creates a new `InvalidKeyId` error.
    #[must_use]
    pub fn invalid_key_id(kid: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKeyId { kid: kid.into(), reason }
    }

    /// Creates a new `KeyGeneration` error.
    #[must_use]
    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration { message: message.into() }
    }

    /// Creates a new `KeyWrite` error.
    #[must_use]
    pub fn key_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::KeyWrite { path: path.into(), source }
    }

    /// Returns `true` for errors that can only happen while building a store.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::KeyLoad { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeyStoreError::key_load("k1.pem", "malformed PEM");
        assert_eq!(err.to_string(), "Failed to load key file 'k1.pem': malformed PEM");

        let err = KeyStoreError::key_not_found("k9");
        assert_eq!(err.to_string(), "Key not found: k9");

        let err = KeyStoreError::no_private_material("partner");
        assert_eq!(err.to_string(), "No private key material for key: partner");

        let err = KeyStoreError::invalid_key_id("../x", "contains forbidden characters");
        assert_eq!(err.to_string(), "Invalid key id '../x': contains forbidden characters");
    }

    #[test]
    fn test_key_load_preserves_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = KeyStoreError::key_load_with_source("k1.pem", "unreadable", io);

        let source = err.source().expect("source exists");
        assert_eq!(source.to_string(), "denied");
        assert!(err.is_load_error());
    }

    #[test]
    fn test_key_write_display_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists");
        let err = KeyStoreError::key_write("/tmp/keys/k1.pem", io);
        assert_eq!(err.to_string(), "Failed to write key file '/tmp/keys/k1.pem'");
        assert!(!err.is_load_error());
    }
}
