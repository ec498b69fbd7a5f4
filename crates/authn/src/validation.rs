//! Token algorithm validation.
//!
//! This module provides the algorithm allow-list check applied to every token
//! header before any key lookup.
//!
//! # Security
//!
//! - The check runs on the raw `alg` string, never on a library-parsed value
//! - Only EdDSA (Ed25519) is accepted
//! - Symmetric algorithms and "none" are always rejected

use crate::error::AuthError;

/// Forbidden algorithms that are never accepted for security reasons.
///
/// These algorithms are blocked because:
/// - `none`: No signature verification (trivially bypassable)
/// - `HS256`, `HS384`, `HS512`: Symmetric algorithms. A verifier that honors them can be tricked
///   into using a public key as the shared secret.
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Accepted algorithms.
///
/// Only EdDSA (Ed25519) is supported end-to-end: the key store holds Ed25519
/// keys only, and per RFC 8725 Section 3.1 a verifier must reject algorithms
/// it does not fully implement.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["EdDSA"];

/// Validate a token's declared algorithm against the allow-list.
///
/// Comparison is exact and case-sensitive, so `"eddsa"` or `"NONE"` are
/// rejected like any other unknown name.
///
/// # Errors
///
/// Returns [`AuthError::AlgorithmNotAllowed`] if:
/// - Algorithm is in [`FORBIDDEN_ALGORITHMS`]
/// - Algorithm is not in [`ACCEPTED_ALGORITHMS`]
///
/// # Examples
///
/// ```
/// use warden_authn::validation::validate_algorithm;
///
/// // EdDSA is accepted
/// assert!(validate_algorithm("EdDSA").is_ok());
///
/// // RS256 is not supported
/// assert!(validate_algorithm("RS256").is_err());
///
/// // Symmetric algorithm rejected
/// assert!(validate_algorithm("HS256").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::algorithm_not_allowed(
            alg,
            format!("Algorithm '{alg}' is not allowed for security reasons"),
        ));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::algorithm_not_allowed(
            alg,
            format!("Algorithm '{alg}' is not in accepted list (only EdDSA is supported)"),
        ));
    }

    Ok(())
}
