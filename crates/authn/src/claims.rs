//! Token claims.
//!
//! The payload carried by every token: the registered claims of RFC 7519
//! plus an application-defined `roles` list.
//!
//! ```json
//! {
//!   "iss": "https://auth.example.com",
//!   "sub": "user:42",
//!   "aud": "https://api.example.com",
//!   "exp": 1767225600,
//!   "iat": 1767222000,
//!   "roles": ["ADMIN"]
//! }
//! ```
//!
//! `roles` is opaque here; interpreting it is the authorization layer's job.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Token claims.
///
/// Only `exp` is mandatory. Unset optional claims are omitted from the
/// payload, and absent claims decode to `None` (or an empty list), so a
/// verified token yields exactly the claims it was issued with.
///
/// # Examples
///
/// ```
/// use warden_authn::Claims;
///
/// let claims = Claims::builder()
///     .sub("user:42")
///     .aud(vec!["https://api.example.com".to_owned()])
///     .exp(1_767_225_600)
///     .roles(vec!["ADMIN".to_owned()])
///     .build();
///
/// assert!(claims.has_role("ADMIN"));
/// assert!(claims.iss.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Claims {
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub iss: Option<String>,

    /// Subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub sub: Option<String>,

    /// Audience. A single value travels as a JSON string, several as an array.
    #[serde(default, with = "audience", skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub aud: Vec<String>,

    /// Expiration time (seconds since epoch).
    pub exp: u64,

    /// Not before (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issued at (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Token ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub jti: Option<String>,

    /// Application-defined roles, in issue order.
    #[serde(default)]
    #[builder(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Claims issued now and expiring after `ttl`.
    ///
    /// Sets `iat` to the current time and `exp` to `iat + ttl`; every other
    /// claim is left unset.
    #[must_use]
    pub fn expiring_in(ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            iss: None,
            sub: None,
            aud: Vec::new(),
            exp: now.saturating_add(ttl.as_secs()),
            nbf: None,
            iat: Some(now),
            jti: None,
            roles: Vec::new(),
        }
    }

    /// Whether `audience` is one of the token's audiences.
    #[must_use]
    pub fn has_audience(&self, audience: &str) -> bool {
        self.aud.iter().any(|a| a == audience)
    }

    /// Whether `role` is one of the token's roles.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Current time in seconds since the epoch.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// `aud` is either a string or an array of strings on the wire.
mod audience {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub(super) fn serialize<S: Serializer>(aud: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match aud {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(aud) => vec![aud],
            OneOrMany::Many(aud) => aud,
        })
    }
}
