//! Authentication error types.
//!
//! This module defines errors that can occur while constructing a
//! [`TokenAuthority`](crate::TokenAuthority), issuing tokens, and verifying
//! them.

use std::sync::Arc;

use thiserror::Error;
use warden_keystore::KeyStoreError;

/// A shared boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Coarse classification of an [`AuthError`].
///
/// Request layers map categories onto responses (a verification failure is a
/// rejected credential, a signing failure is an internal fault) and telemetry
/// aggregates on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Fatal at startup; the process should refuse to run.
    Configuration,
    /// The presented token is not acceptable.
    Verification,
    /// Token issuance failed.
    Signing,
}

impl ErrorCategory {
    /// Stable lowercase name, suitable as a metric label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Verification => "verification",
            Self::Signing => "signing",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    // ========== Configuration-time errors ==========
    /// The configured active key has no private material in the key store.
    #[error("Active signing key unavailable: {kid}")]
    ActiveKeyMissing {
        /// The configured active key ID.
        kid: String,
        /// Why the key store could not supply a signing key.
        #[source]
        source: KeyStoreError,
    },

    /// The key store could not be built.
    #[error("Key store error: {0}")]
    KeyStore(
        /// The underlying key store error.
        #[source]
        KeyStoreError,
    ),

    /// Configuration values are invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the invalid setting.
        message: String,
    },

    // ========== Per-request verification errors ==========
    /// Malformed token: wrong segment count, bad base64 or bad JSON.
    #[error("Invalid token format: {message}")]
    InvalidTokenFormat {
        /// Description of the format error.
        message: String,
    },

    /// The header's `alg` is not in the allow-list.
    #[error("Algorithm not allowed: {message}")]
    AlgorithmNotAllowed {
        /// The algorithm named by the token header.
        alg: String,
        /// Why the algorithm was rejected.
        message: String,
    },

    /// The header carries no `kid`.
    #[error("Token header missing key id")]
    MissingKeyId,

    /// No key with the header's `kid` is in the key store, including a `kid`
    /// that is not a valid key id at all.
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Key ID that was not found.
        kid: String,
    },

    /// Signature verification failed.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token not yet valid (nbf claim in future).
    #[error("Token not yet valid")]
    TokenNotYetValid,

    /// Required claim is missing.
    #[error("Missing claim: {claim}")]
    MissingClaim {
        /// Name of the missing claim.
        claim: String,
    },

    /// Issuer doesn't match the expected value.
    #[error("Invalid issuer: {message}")]
    InvalidIssuer {
        /// Description of the mismatch.
        message: String,
    },

    /// Audience doesn't match the expected value.
    #[error("Invalid audience: {message}")]
    InvalidAudience {
        /// Description of the mismatch.
        message: String,
    },

    // ========== Per-request signing errors ==========
    /// Token signing or encoding failed.
    #[error("Token signing failed: {message}")]
    Signing {
        /// Description of the failure.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<BoxError>,
    },
}

impl AuthError {
    /// Creates a new `ActiveKeyMissing` error.
    #[must_use]
    pub fn active_key_missing(kid: impl Into<String>, source: KeyStoreError) -> Self {
        Self::ActiveKeyMissing { kid: kid.into(), source }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    /// Creates a new `InvalidTokenFormat` error.
    #[must_use]
    pub fn invalid_token_format(message: impl Into<String>) -> Self {
        Self::InvalidTokenFormat { message: message.into() }
    }

    /// Creates a new `AlgorithmNotAllowed` error.
    #[must_use]
    pub fn algorithm_not_allowed(alg: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AlgorithmNotAllowed { alg: alg.into(), message: message.into() }
    }

    /// Creates a new `MissingKeyId` error.
    #[must_use]
    pub fn missing_key_id() -> Self {
        Self::MissingKeyId
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `SignatureInvalid` error.
    #[must_use]
    pub fn signature_invalid() -> Self {
        Self::SignatureInvalid
    }

    /// Creates a new `TokenExpired` error.
    #[must_use]
    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    /// Creates a new `TokenNotYetValid` error.
    #[must_use]
    pub fn token_not_yet_valid() -> Self {
        Self::TokenNotYetValid
    }

    /// Creates a new `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim { claim: claim.into() }
    }

    /// Creates a new `InvalidIssuer` error.
    #[must_use]
    pub fn invalid_issuer(message: impl Into<String>) -> Self {
        Self::InvalidIssuer { message: message.into() }
    }

    /// Creates a new `InvalidAudience` error.
    #[must_use]
    pub fn invalid_audience(message: impl Into<String>) -> Self {
        Self::InvalidAudience { message: message.into() }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into(), source: None }
    }

    /// Creates a new `Signing` error with a source error.
    #[must_use]
    pub fn signing_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Signing { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Classifies the error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ActiveKeyMissing { .. } | Self::KeyStore(_) | Self::InvalidConfig { .. } => {
                ErrorCategory::Configuration
            },
            Self::Signing { .. } => ErrorCategory::Signing,
            Self::InvalidTokenFormat { .. }
            | Self::AlgorithmNotAllowed { .. }
            | Self::MissingKeyId
            | Self::KeyNotFound { .. }
            | Self::SignatureInvalid
            | Self::TokenExpired
            | Self::TokenNotYetValid
            | Self::MissingClaim { .. }
            | Self::InvalidIssuer { .. }
            | Self::InvalidAudience { .. } => ErrorCategory::Verification,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::signature_invalid(),
            ErrorKind::ExpiredSignature => AuthError::token_expired(),
            ErrorKind::ImmatureSignature => AuthError::token_not_yet_valid(),
            ErrorKind::MissingRequiredClaim(claim) => AuthError::missing_claim(claim.as_str()),
            ErrorKind::InvalidAudience => AuthError::invalid_audience("Audience validation failed"),
            ErrorKind::InvalidIssuer => AuthError::invalid_issuer("Issuer validation failed"),
            ErrorKind::InvalidAlgorithm => {
                AuthError::algorithm_not_allowed("unknown", "Algorithm does not match key")
            },
            ErrorKind::InvalidToken => AuthError::invalid_token_format("Invalid JWT structure"),
            _ => AuthError::invalid_token_format(format!("JWT error: {err}")),
        }
    }
}

impl From<KeyStoreError> for AuthError {
    fn from(err: KeyStoreError) -> Self {
        match err {
            KeyStoreError::KeyNotFound { kid } => AuthError::key_not_found(kid),
            other => AuthError::KeyStore(other),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::error::Error as _;

    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_token_format("test");
        assert_eq!(err.to_string(), "Invalid token format: test");

        let err = AuthError::token_expired();
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::missing_claim("exp");
        assert_eq!(err.to_string(), "Missing claim: exp");

        let err = AuthError::key_not_found("k0");
        assert_eq!(err.to_string(), "Signing key not found: k0");

        let err = AuthError::algorithm_not_allowed("HS256", "not allowed for security reasons");
        assert_eq!(err.to_string(), "Algorithm not allowed: not allowed for security reasons");
    }

    #[rstest]
    #[case::signature(ErrorKind::InvalidSignature, "SignatureInvalid")]
    #[case::expired(ErrorKind::ExpiredSignature, "TokenExpired")]
    #[case::immature(ErrorKind::ImmatureSignature, "TokenNotYetValid")]
    #[case::missing_exp(ErrorKind::MissingRequiredClaim("exp".into()), "MissingClaim")]
    #[case::structure(ErrorKind::InvalidToken, "InvalidTokenFormat")]
    #[case::algorithm(ErrorKind::InvalidAlgorithm, "AlgorithmNotAllowed")]
    fn test_error_from_jsonwebtoken(#[case] kind: ErrorKind, #[case] expected: &str) {
        let auth_err: AuthError = JwtError::from(kind).into();
        let debug = format!("{auth_err:?}");
        assert!(debug.starts_with(expected), "expected {expected}, got {debug}");
    }

    #[test]
    fn test_key_not_found_converts_from_key_store() {
        let err: AuthError = KeyStoreError::key_not_found("k0").into();
        assert!(matches!(err, AuthError::KeyNotFound { ref kid } if kid == "k0"));
    }

    #[test]
    fn test_key_store_error_preserves_source_chain() {
        let err: AuthError = KeyStoreError::key_load("k1.pem", "malformed PEM").into();
        assert!(matches!(err, AuthError::KeyStore(_)));

        let source = err.source().expect("source exists");
        assert_eq!(source.to_string(), "Failed to load key file 'k1.pem': malformed PEM");
    }

    #[test]
    fn test_active_key_missing_preserves_source_chain() {
        let err = AuthError::active_key_missing("k1", KeyStoreError::no_private_material("k1"));
        assert_eq!(err.to_string(), "Active signing key unavailable: k1");

        let source = err.source().expect("source exists");
        assert_eq!(source.to_string(), "No private key material for key: k1");
    }

    #[rstest]
    #[case::active_key(
        AuthError::active_key_missing("k", KeyStoreError::key_not_found("k")),
        ErrorCategory::Configuration
    )]
    #[case::config(AuthError::invalid_config("empty issuer"), ErrorCategory::Configuration)]
    #[case::store(
        AuthError::KeyStore(KeyStoreError::key_load("x.pem", "bad")),
        ErrorCategory::Configuration
    )]
    #[case::format(AuthError::invalid_token_format("x"), ErrorCategory::Verification)]
    #[case::alg(AuthError::algorithm_not_allowed("none", "x"), ErrorCategory::Verification)]
    #[case::kid(AuthError::missing_key_id(), ErrorCategory::Verification)]
    #[case::unknown_key(AuthError::key_not_found("k"), ErrorCategory::Verification)]
    #[case::signature(AuthError::signature_invalid(), ErrorCategory::Verification)]
    #[case::expired(AuthError::token_expired(), ErrorCategory::Verification)]
    #[case::immature(AuthError::token_not_yet_valid(), ErrorCategory::Verification)]
    #[case::claim(AuthError::missing_claim("exp"), ErrorCategory::Verification)]
    #[case::issuer(AuthError::invalid_issuer("x"), ErrorCategory::Verification)]
    #[case::audience(AuthError::invalid_audience("x"), ErrorCategory::Verification)]
    #[case::signing(AuthError::signing("x"), ErrorCategory::Signing)]
    fn test_error_category(#[case] err: AuthError, #[case] expected: ErrorCategory) {
        assert_eq!(err.category(), expected);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
        assert_eq!(ErrorCategory::Verification.as_str(), "verification");
        assert_eq!(ErrorCategory::Signing.as_str(), "signing");
    }
}
