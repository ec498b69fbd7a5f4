//! Structured fuzz target for claim decoding and validation.
//!
//! Uses the `arbitrary` crate to generate plausible headers and payloads,
//! signs them with a real key, and runs them through verification. Signed
//! inputs get past the signature check, so this reaches claim decoding and
//! the time, issuer, and audience rules that raw byte fuzzing cannot.

#![no_main]

use std::sync::LazyLock;

use arbitrary::Arbitrary;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value, json};
use warden_authn::{
    AuthError, KeyStore, TokenAuthority,
    testutil::{key_store, sign_payload, test_key},
};

static STORE: LazyLock<std::sync::Arc<KeyStore>> =
    LazyLock::new(|| key_store(&[&test_key("k1")], &[]));

static AUTHORITY: LazyLock<TokenAuthority> = LazyLock::new(|| {
    TokenAuthority::new("k1", std::sync::Arc::clone(&STORE))
        .expect("fuzz authority")
        .with_issuer("https://auth.example.com")
        .with_audience("https://api.example.com")
});

/// Structured input representing a fuzzed token payload.
#[derive(Debug, Arbitrary)]
struct FuzzedClaims {
    iss: Option<String>,
    sub: Option<String>,
    aud: FuzzedAudience,
    exp: Option<FuzzedNumber>,
    nbf: Option<FuzzedNumber>,
    iat: Option<FuzzedNumber>,
    roles: Vec<String>,
    /// Sign the payload (true) or attach an arbitrary signature (false)
    signed: bool,
    signature_bytes: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
enum FuzzedAudience {
    Absent,
    One(String),
    Many(Vec<String>),
    NotAString(i64),
}

#[derive(Debug, Arbitrary)]
enum FuzzedNumber {
    Unsigned(u64),
    Negative(i64),
    Float(f64),
    Text(String),
}

impl FuzzedNumber {
    fn to_json(&self) -> Value {
        match self {
            Self::Unsigned(n) => json!(n),
            Self::Negative(n) => json!(n),
            Self::Float(f) => json!(f),
            Self::Text(s) => json!(s),
        }
    }
}

fn payload(input: &FuzzedClaims) -> Value {
    let mut payload = Map::new();
    if let Some(ref iss) = input.iss {
        payload.insert("iss".to_owned(), json!(iss));
    }
    if let Some(ref sub) = input.sub {
        payload.insert("sub".to_owned(), json!(sub));
    }
    match &input.aud {
        FuzzedAudience::Absent => {},
        FuzzedAudience::One(aud) => {
            payload.insert("aud".to_owned(), json!(aud));
        },
        FuzzedAudience::Many(aud) => {
            payload.insert("aud".to_owned(), json!(aud));
        },
        FuzzedAudience::NotAString(n) => {
            payload.insert("aud".to_owned(), json!(n));
        },
    }
    for (name, value) in [("exp", &input.exp), ("nbf", &input.nbf), ("iat", &input.iat)] {
        if let Some(value) = value {
            payload.insert(name.to_owned(), value.to_json());
        }
    }
    payload.insert("roles".to_owned(), json!(input.roles));
    Value::Object(payload)
}

fuzz_target!(|input: FuzzedClaims| {
    let payload = payload(&input);

    let token = if input.signed {
        sign_payload(&STORE, "k1", &payload)
    } else {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT","kid":"k1"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap_or_default());
        let signature = URL_SAFE_NO_PAD.encode(&input.signature_bytes);
        format!("{header}.{body}.{signature}")
    };

    match AUTHORITY.verify(&token) {
        Ok(claims) => {
            assert!(input.signed, "unsigned payload verified");
            assert_eq!(claims.iss.as_deref(), Some("https://auth.example.com"));
            assert!(claims.has_audience("https://api.example.com"));
        },
        Err(AuthError::SignatureInvalid) => assert!(!input.signed, "signed payload rejected"),
        Err(_) => {},
    }
});
