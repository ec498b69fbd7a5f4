//! Token issuance and verification.
//!
//! A [`TokenAuthority`] signs every new token with the single *active* key and
//! verifies tokens with whichever key their header names:
//!
//! ```text
//! issue(claims)  ──► KeyStore::private_key(active_kid) ──► header.payload.signature
//!
//! verify(token)  ──► header.alg in allow-list?
//!                ──► header.kid ──► KeyStore::public_key(kid)
//!                ──► signature ──► exp / nbf ──► iss / aud ──► Claims
//! ```
//!
//! Key selection on verification is driven by the token's own `kid` and is a
//! single map lookup. There is no fallback that tries other keys, so a token
//! signed by a key that has been dropped from the store is simply unknown.

use std::{collections::HashSet, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use fail::fail_point;
use jsonwebtoken::{Algorithm, Header, Validation};
use serde::Deserialize;
use warden_keystore::{KeyStore, validate_kid};

use crate::{
    claims::{Claims, unix_now},
    config::{AuthnConfig, DEFAULT_LEEWAY, DEFAULT_TOKEN_TTL},
    error::{AuthError, Result},
    validation::validate_algorithm,
};

/// The algorithm every issued token is signed with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// The `typ` header value of issued tokens.
pub const TOKEN_TYPE: &str = "JWT";

/// A token header as it appears on the wire, before any trust decision.
///
/// `alg` is kept as the raw string so that names a JOSE library cannot
/// represent (`"none"`, typos, lowercase variants) are still visible to the
/// allow-list check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Declared signing algorithm.
    pub alg: String,
    /// Key identifier.
    #[serde(default)]
    pub kid: Option<String>,
    /// Token type.
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decode a token's header without verifying anything.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTokenFormat`] if:
/// - The token does not have exactly 3 parts separated by dots
/// - The header is not base64url
/// - The header is not a JSON object with a string `alg`
pub fn decode_token_header(token: &str) -> Result<TokenHeader> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::invalid_token_format("token must have 3 parts separated by dots"));
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(parts[0]).map_err(|e| {
        AuthError::invalid_token_format(format!("failed to decode token header: {e}"))
    })?;

    serde_json::from_slice(&header_bytes)
        .map_err(|e| AuthError::invalid_token_format(format!("failed to parse token header: {e}")))
}

/// Issues and verifies tokens against a shared [`KeyStore`].
///
/// Holds no per-call state: `issue` and `verify` take `&self` and may run in
/// parallel from any number of threads.
///
/// # Example
///
/// ```
/// use std::{sync::Arc, time::Duration};
/// use warden_authn::{Claims, TokenAuthority};
/// use warden_keystore::{GeneratedKeyPair, KeyStore, MemoryKeySource};
///
/// let pair = GeneratedKeyPair::generate("k1")?;
/// let store = KeyStore::load(&MemoryKeySource::new().with_file("k1.pem", pair.private_pem()))?;
///
/// let authority = TokenAuthority::new("k1", Arc::new(store))?;
/// let mut claims = Claims::expiring_in(Duration::from_secs(60));
/// claims.roles = vec!["ADMIN".to_owned()];
///
/// let token = authority.issue(&claims)?;
/// assert_eq!(authority.verify(&token)?, claims);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    active_kid: String,
    key_store: Arc<KeyStore>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway: Duration,
    token_ttl: Duration,
    validation: Validation,
}

impl TokenAuthority {
    /// Creates an authority signing with `active_kid`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ActiveKeyMissing`] if `active_kid` is unknown to
    /// `key_store` or only its public half is held.
    #[tracing::instrument(skip(key_store), fields(keys = key_store.len()))]
    pub fn new(active_kid: &str, key_store: Arc<KeyStore>) -> Result<Self> {
        key_store
            .private_key(active_kid)
            .map_err(|e| AuthError::active_key_missing(active_kid, e))?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Temporal, issuer, and audience checks run in `validate_claims`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_owned()]);

        tracing::debug!("token authority ready");
        Ok(Self {
            active_kid: active_kid.to_owned(),
            key_store,
            issuer: None,
            audience: None,
            leeway: DEFAULT_LEEWAY,
            token_ttl: DEFAULT_TOKEN_TTL,
            validation,
        })
    }

    /// Loads the configured key directory and creates an authority from it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidConfig`] if the configuration is invalid
    /// - [`AuthError::KeyStore`] if the key directory cannot be loaded
    /// - [`AuthError::ActiveKeyMissing`] if the active key cannot sign
    pub fn from_config(config: &AuthnConfig) -> Result<Self> {
        config.validate()?;
        let key_store = KeyStore::load_dir(config.keys_dir()).map_err(AuthError::KeyStore)?;

        let mut authority = Self::new(config.active_kid(), Arc::new(key_store))?
            .with_leeway(config.leeway())
            .with_token_ttl(config.token_ttl());
        authority.issuer = config.issuer().map(str::to_owned);
        authority.audience = config.audience().map(str::to_owned);
        Ok(authority)
    }

    /// Requires verified tokens to carry `iss == issuer`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Requires verified tokens to list `audience` in `aud`.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Tolerates clock skew of up to `leeway` on `exp` and `nbf`.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Sets the lifetime used by [`TokenAuthority::fresh_claims`].
    #[must_use]
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// The key ID new tokens are signed with.
    #[must_use]
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// The key store this authority reads.
    #[must_use]
    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    /// The required issuer, if any.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// The required audience, if any.
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// The clock-skew leeway.
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Claims issued now, expiring after the configured token lifetime and
    /// stamped with the configured issuer and audience.
    #[must_use]
    pub fn fresh_claims(&self) -> Claims {
        let mut claims = Claims::expiring_in(self.token_ttl);
        claims.iss = self.issuer.clone();
        claims.aud = self.audience.iter().cloned().collect();
        claims
    }

    /// Signs `claims` with the active key.
    ///
    /// The header is `{"typ": "JWT", "alg": "EdDSA", "kid": <active kid>}`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the active key is unavailable or
    /// encoding fails.
    #[tracing::instrument(skip(self, claims), fields(kid = %self.active_kid))]
    pub fn issue(&self, claims: &Claims) -> Result<String> {
        fail_point!("authority-issue", |_| Err(AuthError::signing("injected signing failure")));

        let key = self
            .key_store
            .private_key(&self.active_kid)
            .map_err(|e| AuthError::signing_with_source("active key unavailable", e))?;

        let mut header = Header::new(SIGNING_ALGORITHM);
        header.typ = Some(TOKEN_TYPE.to_owned());
        header.kid = Some(self.active_kid.clone());

        let token = jsonwebtoken::encode(&header, claims, key)
            .map_err(|e| AuthError::signing_with_source("failed to encode token", e))?;

        tracing::debug!("token issued");
        Ok(token)
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Checks run in order and the first failure is returned:
    ///
    /// 1. Structure and header decoding ([`AuthError::InvalidTokenFormat`])
    /// 2. `alg` allow-list ([`AuthError::AlgorithmNotAllowed`])
    /// 3. `kid` present ([`AuthError::MissingKeyId`])
    /// 4. Key lookup ([`AuthError::KeyNotFound`]); a `kid` that could never
    ///    name a key file is reported the same way as an unknown one
    /// 5. Signature ([`AuthError::SignatureInvalid`])
    /// 6. `exp` present ([`AuthError::MissingClaim`])
    /// 7. Claims, see [`TokenAuthority::validate_claims`]
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing check.
    #[tracing::instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let header = decode_token_header(token)?;

        // Before any key material is touched.
        validate_algorithm(&header.alg)?;

        let kid = header.kid.ok_or_else(AuthError::missing_key_id)?;
        validate_kid(&kid).map_err(|_| AuthError::key_not_found(kid.as_str()))?;

        let key = self.key_store.public_key(&kid)?;
        // Decoded untyped first so a missing `exp` surfaces as a missing claim
        // rather than a payload shape error.
        let data = jsonwebtoken::decode::<serde_json::Value>(token, key, &self.validation)?;
        let claims: Claims = serde_json::from_value(data.claims).map_err(|e| {
            AuthError::invalid_token_format(format!("failed to parse token claims: {e}"))
        })?;

        self.validate_claims(&claims, unix_now())?;

        tracing::debug!(kid = %kid, "token verified");
        Ok(claims)
    }

    /// Validates already-authenticated claims as of `now` (seconds since the
    /// epoch).
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenExpired`] if `now > exp + leeway`
    /// - [`AuthError::TokenNotYetValid`] if `now + leeway < nbf`
    /// - [`AuthError::InvalidIssuer`] if an issuer is required and `iss` differs
    /// - [`AuthError::InvalidAudience`] if an audience is required and absent from `aud`
    pub fn validate_claims(&self, claims: &Claims, now: u64) -> Result<()> {
        let leeway = self.leeway.as_secs();

        if now > claims.exp.saturating_add(leeway) {
            return Err(AuthError::token_expired());
        }

        if let Some(nbf) = claims.nbf
            && now.saturating_add(leeway) < nbf
        {
            return Err(AuthError::token_not_yet_valid());
        }

        if let Some(expected) = self.issuer.as_deref()
            && claims.iss.as_deref() != Some(expected)
        {
            return Err(AuthError::invalid_issuer(format!(
                "expected '{expected}', got '{}'",
                claims.iss.as_deref().unwrap_or_default()
            )));
        }

        if let Some(expected) = self.audience.as_deref()
            && !claims.has_audience(expected)
        {
            return Err(AuthError::invalid_audience(format!(
                "expected '{expected}', got {:?}",
                claims.aud
            )));
        }

        Ok(())
    }
}
