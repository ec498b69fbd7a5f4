//! # Warden Authentication
//!
//! Key-rotation-aware token issuance and verification.
//!
//! This crate provides:
//! - **Token authority**: Signs tokens with one active key, verifies them by the key their header
//!   names
//! - **Claims**: Registered claims plus an application-defined roles list
//! - **Algorithm validation**: A fixed allow-list checked before any key lookup
//!
//! ## Features
//!
//! - Only EdDSA (Ed25519) is supported
//! - Symmetric algorithms (HS256, etc.) and `none` are explicitly rejected
//! - Rotation without downtime: retired keys stay verifiable for as long as their public half
//!   remains in the key store
//!
//! ## Example
//!
//! ```no_run
//! use warden_authn::{AuthnConfig, TokenAuthority};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthnConfig::builder()
//!     .keys_dir("/etc/warden/keys")
//!     .active_kid("2024-06")
//!     .issuer("https://auth.example.com")
//!     .build()?;
//! let authority = TokenAuthority::from_config(&config)?;
//!
//! let mut claims = authority.fresh_claims();
//! claims.sub = Some("user:42".to_owned());
//! let token = authority.issue(&claims)?;
//!
//! let verified = authority.verify(&token)?;
//! println!("Verified subject: {}", verified.sub.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Token issuance and verification.
pub mod authority;
/// Token claims.
pub mod claims;
/// Token authority configuration.
pub mod config;
/// Authentication error types.
pub mod error;
/// Shared test utilities (requires the `testutil` feature).
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
/// Algorithm validation.
pub mod validation;

// Re-export key types for convenience
pub use authority::{TokenAuthority, TokenHeader, decode_token_header};
pub use claims::Claims;
pub use config::AuthnConfig;
pub use error::{AuthError, ErrorCategory, Result};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
pub use warden_keystore::{KeyStore, KeyStoreError};
