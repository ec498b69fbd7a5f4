//! Key identifier (`kid`) format rules.
//!
//! The same rules apply to identifiers derived from key file names at load
//! time and to identifiers read from untrusted token headers at verification
//! time.

use crate::error::{KeyStoreError, Result};

/// Maximum length of a key identifier, in bytes.
pub const MAX_KID_LENGTH: usize = 128;

/// Validates a key identifier.
///
/// A valid `kid` is 1 to [`MAX_KID_LENGTH`] bytes of `[A-Za-z0-9._-]` and
/// does not start with `.`. This keeps identifiers usable as file stems and
/// rules out path traversal, whitespace, and control characters.
///
/// # Errors
///
/// Returns [`KeyStoreError::InvalidKeyId`] naming the broken rule.
///
/// # Examples
///
/// ```
/// use warden_keystore::validate_kid;
///
/// assert!(validate_kid("54bb2165-71e1-41a6-af3e-7da4a0e1e2c1").is_ok());
/// assert!(validate_kid("../../etc/passwd").is_err());
/// ```
pub fn validate_kid(kid: &str) -> Result<()> {
    if kid.is_empty() {
        return Err(KeyStoreError::invalid_key_id(kid, "must not be empty"));
    }
    if kid.len() > MAX_KID_LENGTH {
        return Err(KeyStoreError::invalid_key_id(kid, "exceeds maximum length"));
    }
    if kid.starts_with('.') {
        return Err(KeyStoreError::invalid_key_id(kid, "must not start with '.'"));
    }
    if !kid.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')) {
        return Err(KeyStoreError::invalid_key_id(kid, "contains forbidden characters"));
    }
    Ok(())
}
