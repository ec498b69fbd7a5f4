#![allow(clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use warden_authn::{
    Claims, KeyStore, TokenAuthority,
    testutil::{memory_source, test_key},
};
use warden_keystore::GeneratedKeyPair;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An authority signing with `k0` whose store also holds `retired` public-only keys.
fn authority_with_retired(retired: usize) -> TokenAuthority {
    let active = test_key("k0");
    let old: Vec<GeneratedKeyPair> = (1..=retired).map(|i| test_key(&format!("k{i}"))).collect();
    let old_refs: Vec<&GeneratedKeyPair> = old.iter().collect();

    let store = KeyStore::load(&memory_source(&[&active], &old_refs)).expect("load key store");
    TokenAuthority::new("k0", Arc::new(store)).expect("authority")
}

fn claims() -> Claims {
    let mut claims = Claims::expiring_in(Duration::from_secs(3600));
    claims.sub = Some("user:42".to_owned());
    claims.iss = Some("https://auth.example.com".to_owned());
    claims.roles = vec!["ADMIN".to_owned(), "USER".to_owned()];
    claims
}

// ---------------------------------------------------------------------------
// 1. issue
// ---------------------------------------------------------------------------

fn issue(c: &mut Criterion) {
    let authority = authority_with_retired(0);
    let claims = claims();

    c.bench_function("issue", |b| {
        b.iter(|| authority.issue(&claims).expect("issue failed"));
    });
}

// ---------------------------------------------------------------------------
// 2. verify
// ---------------------------------------------------------------------------

fn verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    // Key lookup is by kid, so store size should not move the numbers.
    for &retired in &[0usize, 16, 256] {
        let authority = authority_with_retired(retired);
        let token = authority.issue(&claims()).expect("issue failed");
        group.bench_with_input(BenchmarkId::new("valid", retired), &token, |b, token| {
            b.iter(|| authority.verify(token).expect("verify failed"));
        });
    }

    // -- rejected before any key lookup --
    {
        let authority = authority_with_retired(0);
        let token = authority.issue(&claims()).expect("issue failed");
        let mut parts: Vec<&str> = token.split('.').collect();
        // {"alg":"none","kid":"k0"}
        parts[0] = "eyJhbGciOiJub25lIiwia2lkIjoiazAifQ";
        let forged = parts.join(".");
        group.bench_function("alg_none_rejected", |b| {
            b.iter(|| authority.verify(&forged).expect_err("alg none must fail"));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. key store load
// ---------------------------------------------------------------------------

fn load(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_store_load");
    group.measurement_time(Duration::from_secs(5));

    for &count in &[1usize, 16, 64] {
        let keys: Vec<GeneratedKeyPair> = (0..count).map(|i| test_key(&format!("k{i}"))).collect();
        let refs: Vec<&GeneratedKeyPair> = keys.iter().collect();
        let source = memory_source(&refs, &[]);
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| KeyStore::load(source).expect("load failed"));
        });
    }

    group.finish();
}

criterion_group!(benches, issue, verify, load);
criterion_main!(benches);
