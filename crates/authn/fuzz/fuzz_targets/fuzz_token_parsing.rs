//! Fuzz target for token parsing and verification.
//!
//! Feeds arbitrary byte strings as tokens to the header decoder and to a
//! live authority. Every result must be either `Ok(...)` or `Err(AuthError)`;
//! nothing built from random bytes may verify.

#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use warden_authn::{
    TokenAuthority, decode_token_header,
    testutil::{key_store, test_key},
    validate_algorithm,
};
use warden_keystore::validate_kid;

static AUTHORITY: LazyLock<TokenAuthority> = LazyLock::new(|| {
    let active = test_key("k1");
    let retired = test_key("k0");
    TokenAuthority::new("k1", key_store(&[&active], &[&retired]))
        .expect("fuzz authority")
        .with_issuer("https://auth.example.com")
});

fuzz_target!(|data: &[u8]| {
    // Tokens are always UTF-8 strings
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    // Header decoding must not panic on any input
    if let Ok(header) = decode_token_header(token) {
        let _ = validate_algorithm(&header.alg);
        if let Some(ref kid) = header.kid {
            let _ = validate_kid(kid);
        }
    }

    // Without a private key the fuzzer cannot produce a valid signature
    assert!(AUTHORITY.verify(token).is_err(), "random input verified: {token:?}");
});
