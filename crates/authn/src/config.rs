//! Configuration for the token authority.
//!
//! [`AuthnConfig`] names the key directory, the active signing key, and the
//! claim policy a [`TokenAuthority`](crate::TokenAuthority) enforces. It can be
//! built in code or deserialized:
//!
//! ```toml
//! keys_dir = "/etc/warden/keys"
//! active_kid = "2024-06"
//! issuer = "https://auth.example.com"
//! audience = "https://api.example.com"
//! leeway = "30s"
//! token_ttl = "1h"
//! ```

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Default clock-skew leeway applied to `exp` and `nbf` (none).
pub const DEFAULT_LEEWAY: Duration = Duration::ZERO;

/// Default lifetime of issued tokens (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Default key directory.
pub const DEFAULT_KEYS_DIR: &str = "keys";

/// Token authority configuration.
///
/// Deserialized values are not validated until [`AuthnConfig::validate`] runs;
/// [`TokenAuthority::from_config`](crate::TokenAuthority::from_config) does so
/// before touching the key directory.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use warden_authn::AuthnConfig;
///
/// let config = AuthnConfig::builder()
///     .keys_dir("/etc/warden/keys")
///     .active_kid("2024-06")
///     .issuer("https://auth.example.com")
///     .token_ttl(Duration::from_secs(900))
///     .build()?;
///
/// assert_eq!(config.active_kid(), "2024-06");
/// assert_eq!(config.leeway(), Duration::ZERO);
/// # Ok::<(), warden_authn::AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthnConfig {
    /// Directory holding `<kid>.pem` key files.
    #[serde(default = "default_keys_dir")]
    pub(crate) keys_dir: PathBuf,

    /// Key ID used to sign new tokens.
    pub(crate) active_kid: String,

    /// Issuer stamped on issued tokens and required on verified ones.
    #[serde(default)]
    pub(crate) issuer: Option<String>,

    /// Audience stamped on issued tokens and required on verified ones.
    #[serde(default)]
    pub(crate) audience: Option<String>,

    /// Clock-skew leeway for `exp` and `nbf`.
    #[serde(with = "humantime_serde", default = "default_leeway")]
    pub(crate) leeway: Duration,

    /// Lifetime of issued tokens.
    #[serde(with = "humantime_serde", default = "default_token_ttl")]
    pub(crate) token_ttl: Duration,
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from(DEFAULT_KEYS_DIR)
}

fn default_leeway() -> Duration {
    DEFAULT_LEEWAY
}

fn default_token_ttl() -> Duration {
    DEFAULT_TOKEN_TTL
}

#[bon::bon]
impl AuthnConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Optional Fields
    ///
    /// * `keys_dir` - Key directory (default: `keys`).
    /// * `issuer` - Expected issuer (default: none, not checked).
    /// * `audience` - Expected audience (default: none, not checked).
    /// * `leeway` - Clock-skew leeway (default: 0 seconds).
    /// * `token_ttl` - Issued token lifetime (default: 1 hour).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if validation fails; see
    /// [`AuthnConfig::validate`].
    #[builder]
    pub fn new(
        #[builder(into, default = default_keys_dir())] keys_dir: PathBuf,
        #[builder(into)] active_kid: String,
        #[builder(into)] issuer: Option<String>,
        #[builder(into)] audience: Option<String>,
        #[builder(default = DEFAULT_LEEWAY)] leeway: Duration,
        #[builder(default = DEFAULT_TOKEN_TTL)] token_ttl: Duration,
    ) -> Result<Self> {
        let config = Self { keys_dir, active_kid, issuer, audience, leeway, token_ttl };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if:
    /// - `active_kid` is empty
    /// - `issuer` or `audience` is set to an empty string
    /// - `token_ttl` is zero
    pub fn validate(&self) -> Result<()> {
        if self.active_kid.is_empty() {
            return Err(AuthError::invalid_config("active_kid cannot be empty"));
        }
        if self.issuer.as_deref().is_some_and(str::is_empty) {
            return Err(AuthError::invalid_config("issuer cannot be empty when set"));
        }
        if self.audience.as_deref().is_some_and(str::is_empty) {
            return Err(AuthError::invalid_config("audience cannot be empty when set"));
        }
        if self.token_ttl.is_zero() {
            return Err(AuthError::invalid_config("token_ttl must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the key directory.
    #[must_use]
    pub fn keys_dir(&self) -> &std::path::Path {
        &self.keys_dir
    }

    /// Returns the active key ID.
    #[must_use]
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Returns the expected issuer, if configured.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Returns the expected audience, if configured.
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Returns the clock-skew leeway.
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Returns the issued token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AuthnConfig::builder().active_kid("k1").build().unwrap();

        assert_eq!(config.keys_dir(), std::path::Path::new("keys"));
        assert_eq!(config.active_kid(), "k1");
        assert!(config.issuer().is_none());
        assert!(config.audience().is_none());
        assert_eq!(config.leeway(), Duration::ZERO);
        assert_eq!(config.token_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_validation_empty_active_kid() {
        let result = AuthnConfig::builder().active_kid("").build();
        assert!(matches!(result, Err(AuthError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validation_empty_issuer() {
        let result = AuthnConfig::builder().active_kid("k1").issuer("").build();
        assert!(
            matches!(&result, Err(AuthError::InvalidConfig { message }) if message.contains("issuer"))
        );
    }

    #[test]
    fn test_validation_empty_audience() {
        let result = AuthnConfig::builder().active_kid("k1").audience("").build();
        assert!(
            matches!(&result, Err(AuthError::InvalidConfig { message }) if message.contains("audience"))
        );
    }

    #[test]
    fn test_validation_zero_ttl() {
        let result = AuthnConfig::builder().active_kid("k1").token_ttl(Duration::ZERO).build();
        assert!(
            matches!(&result, Err(AuthError::InvalidConfig { message }) if message.contains("token_ttl"))
        );
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let config: AuthnConfig = serde_json::from_value(serde_json::json!({
            "keys_dir": "/etc/warden/keys",
            "active_kid": "2024-06",
            "issuer": "https://auth.example.com",
            "leeway": "30s",
            "token_ttl": "15m",
        }))
        .unwrap();

        assert_eq!(config.keys_dir(), std::path::Path::new("/etc/warden/keys"));
        assert_eq!(config.issuer(), Some("https://auth.example.com"));
        assert_eq!(config.leeway(), Duration::from_secs(30));
        assert_eq!(config.token_ttl(), Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: AuthnConfig =
            serde_json::from_value(serde_json::json!({"active_kid": "k1"})).unwrap();

        assert_eq!(config, AuthnConfig::builder().active_kid("k1").build().unwrap());
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_value::<AuthnConfig>(serde_json::json!({
            "active_kid": "k1",
            "algorithm": "HS256",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialized_config_still_validated() {
        let config: AuthnConfig =
            serde_json::from_value(serde_json::json!({"active_kid": "k1", "token_ttl": "0s"}))
                .unwrap();
        assert!(matches!(config.validate(), Err(AuthError::InvalidConfig { .. })));
    }
}
