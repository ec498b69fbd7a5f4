//! Admin tool error types.

use warden_authn::AuthError;
use warden_keystore::KeyStoreError;

/// Result type alias for admin commands.
pub type Result<T> = std::result::Result<T, AdminError>;

/// Errors returned by admin commands.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AdminError {
    /// Key generation or key file I/O failed.
    #[error("key error: {0}")]
    Key(#[from] KeyStoreError),

    /// Configuration, issuance, or verification failed.
    #[error("token error: {0}")]
    Auth(#[from] AuthError),

    /// Claims could not be rendered.
    #[error("failed to render claims: {0}")]
    Render(#[from] serde_json::Error),

    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
