//! Integration test verifying that `#[instrument]` annotations produce
//! spans for key loading, authority construction, issuance, and verification.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};
use warden_authn::{
    Claims, KeyStore, TokenAuthority,
    testutil::{memory_source, test_key},
};

// ---------------------------------------------------------------------------
// Collecting layer, records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

fn authority() -> TokenAuthority {
    let key = test_key("k1");
    let store = KeyStore::load(&memory_source(&[&key], &[])).expect("load");
    TokenAuthority::new("k1", Arc::new(store)).expect("authority")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn key_store_load_creates_span() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let key = test_key("k1");
    KeyStore::load(&memory_source(&[&key], &[])).expect("load should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "load"), "expected a 'load' span, got: {recorded:?}");
}

#[test]
fn authority_new_creates_span() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let _authority = authority();

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "new"), "expected a 'new' span, got: {recorded:?}");
}

#[test]
fn authority_issue_creates_span() {
    let authority = authority();

    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    authority.issue(&Claims::builder().exp(u64::MAX / 2).build()).expect("issue should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "issue"), "expected an 'issue' span, got: {recorded:?}");
}

#[test]
fn authority_verify_creates_span_on_failure() {
    let authority = authority();

    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let _ = authority.verify("not.a.token");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "verify"), "expected a 'verify' span, got: {recorded:?}");
}
