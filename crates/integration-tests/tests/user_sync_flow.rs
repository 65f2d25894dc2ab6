//! End-to-end reconciliation flow: session load, sync, render gate.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use outlay_integration_tests::backend::TestBackend;
use outlay_integration_tests::provider::TestProvider;
use outlay_integration_tests::{identity, test_config, wait_for_gate};
use outlay_shell::api::ApiClient;
use outlay_shell::backend::UserGateway;
use outlay_shell::identity::SessionState;
use outlay_shell::notify::{Notice, NoticeSink};
use outlay_shell::reconcile::{Phase, Reconciler, ReconcilerHandle};

struct Harness {
    backend: TestBackend,
    provider: Arc<TestProvider>,
    handle: ReconcilerHandle,
    notices: mpsc::UnboundedReceiver<Notice>,
}

async fn harness() -> Harness {
    let backend = TestBackend::spawn().await;
    let config = test_config(&backend.base_url);
    let api = ApiClient::new(&config).expect("client");
    let gateway = UserGateway::new(api, config.user_cache_ttl);
    let provider = Arc::new(TestProvider::new());
    let (sink, notices) = NoticeSink::channel();
    let handle = Reconciler::new(Arc::clone(&provider), gateway, sink).spawn();

    Harness {
        backend,
        provider,
        handle,
        notices,
    }
}

#[tokio::test]
async fn session_loads_syncs_once_and_stays_synced() {
    let mut h = harness().await;
    let mut gate = h.handle.gate();

    // Provider still loading: not ready, nothing attempted.
    assert!(!h.handle.current().ready());
    assert_eq!(h.backend.sync_calls(), 0);

    // Hold the backend so the syncing window is observable.
    h.backend.hold_sync(true);
    h.provider.set_token(Some("tok_u1"));
    h.provider.sign_in(identity("u1", Some("a@b.com")));

    let syncing = wait_for_gate(&mut gate, |g| g.syncing).await;
    assert!(!syncing.ready());
    assert!(syncing.signed_in);

    h.backend.hold_sync(false);
    let synced = wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;
    assert!(synced.ready());
    assert!(!synced.error());
    assert!(!synced.syncing);
    assert_eq!(h.backend.sync_calls(), 1);
    assert_eq!(
        h.backend.last_authorization().await.as_deref(),
        Some("Bearer tok_u1"),
        "session token travels as a bearer token"
    );

    // Re-emitting the same identity issues no new call.
    h.provider.sign_in(identity("u1", Some("a@b.com")));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.backend.sync_calls(), 1);
    assert_eq!(h.handle.current().phase, Phase::Synced);

    // No notices on the happy path.
    assert!(h.notices.try_recv().is_err());

    h.handle.shutdown().await;
}

#[tokio::test]
async fn signed_out_session_is_ready_without_backend_calls() {
    let h = harness().await;
    let mut gate = h.handle.gate();

    h.provider.emit(SessionState::SignedOut);

    let g = wait_for_gate(&mut gate, |g| g.ready()).await;
    assert_eq!(g.phase, Phase::Unauthenticated);
    assert!(!g.signed_in);
    assert_eq!(h.backend.sync_calls(), 0);
    assert_eq!(h.backend.list_calls(), 0);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn sign_out_after_sync_returns_to_unauthenticated() {
    let h = harness().await;
    let mut gate = h.handle.gate();

    h.provider.sign_in(identity("u1", Some("a@b.com")));
    wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;

    h.provider.emit(SessionState::SignedOut);
    let g = wait_for_gate(&mut gate, |g| g.phase == Phase::Unauthenticated).await;
    assert!(g.ready());

    h.handle.shutdown().await;
}
