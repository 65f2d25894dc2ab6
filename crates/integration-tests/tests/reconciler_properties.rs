//! Race-safety and idempotency properties of the reconciler.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use outlay_integration_tests::backend::TestBackend;
use outlay_integration_tests::provider::TestProvider;
use outlay_integration_tests::{identity, test_config, wait_for_gate, wait_until};
use outlay_shell::api::ApiClient;
use outlay_shell::backend::UserGateway;
use outlay_shell::notify::{Notice, NoticeLevel, NoticeSink};
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
async fn at_most_one_sync_in_flight_under_reevaluation_storm() {
    let h = harness().await;
    let mut gate = h.handle.gate();

    h.backend.hold_sync(true);
    h.provider.sign_in(identity("u1", Some("a@b.com")));
    wait_for_gate(&mut gate, |g| g.syncing).await;

    // Re-emissions and retries while the call is outstanding must not
    // issue a second call.
    for _ in 0..5 {
        h.provider.sign_in(identity("u1", Some("a@b.com")));
        h.handle.retry();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(h.backend.sync_calls(), 1);

    h.backend.hold_sync(false);
    wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;
    assert_eq!(h.backend.sync_calls(), 1);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn errors_gate_until_an_explicit_retry() {
    let mut h = harness().await;
    let mut gate = h.handle.gate();

    h.backend.fail_sync(true);
    h.provider.sign_in(identity("u1", Some("a@b.com")));

    let errored = wait_for_gate(&mut gate, |g| g.error()).await;
    assert!(errored.ready(), "error screens render instead of spinning");
    assert_eq!(errored.phase, Phase::Errored);

    let notice = h.notices.recv().await.expect("failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);

    // Re-evaluations do not auto-retry.
    for _ in 0..3 {
        h.provider.sign_in(identity("u1", Some("a@b.com")));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(h.backend.sync_calls(), 1);
    assert_eq!(h.handle.current().phase, Phase::Errored);

    // An explicit retry re-enters the sync rule.
    h.backend.fail_sync(false);
    h.handle.retry();
    wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;
    assert_eq!(h.backend.sync_calls(), 2);

    h.handle.shutdown().await;
}

#[tokio::test]
async fn identity_switch_syncs_the_new_identity_fresh() {
    let h = harness().await;
    let mut gate = h.handle.gate();

    h.provider.sign_in(identity("u1", Some("a@b.com")));
    wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;
    assert_eq!(h.backend.sync_calls(), 1);

    h.provider.sign_in(identity("u2", Some("c@d.com")));
    wait_until(|| h.backend.sync_calls() == 2).await;
    wait_for_gate(&mut gate, |g| g.phase == Phase::Synced).await;

    let users = h.backend.users().await;
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.clerk_id.as_str() == "u1"));
    assert!(users.iter().any(|u| u.clerk_id.as_str() == "u2"));

    h.handle.shutdown().await;
}

#[tokio::test]
async fn missing_email_signs_out_once_and_never_calls_the_backend() {
    let mut h = harness().await;
    let mut gate = h.handle.gate();

    h.provider.sign_in(identity("u1", None));

    // The scripted provider confirms the sign-out with a signed-out
    // snapshot, which the machine treats as ready.
    let g = wait_for_gate(&mut gate, |g| g.ready()).await;
    assert_eq!(g.phase, Phase::Unauthenticated);

    assert_eq!(h.provider.sign_outs(), 1);
    assert_eq!(h.backend.sync_calls(), 0);

    let notice = h.notices.recv().await.expect("precondition notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("email"));

    h.handle.shutdown().await;
}

#[tokio::test]
async fn stale_completion_does_not_touch_the_new_identity() {
    let h = harness().await;
    let mut gate = h.handle.gate();

    // u1's sync is issued and held open.
    h.backend.hold_sync(true);
    h.provider.sign_in(identity("u1", Some("a@b.com")));
    wait_for_gate(&mut gate, |g| g.syncing).await;
    assert_eq!(h.backend.sync_calls(), 1);

    // Switch to u2 while u1's call is outstanding; the single slot keeps
    // u2's sync queued behind it.
    h.provider.sign_in(identity("u2", Some("c@d.com")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.backend.sync_calls(), 1);

    // u1's held call completes successfully, but u2's own call (issued
    // after the slot frees) fails. If the stale success leaked into u2's
    // record the gate would report Synced; it must report Errored.
    h.backend.fail_sync(true);
    h.backend.hold_sync(false);

    let g = wait_for_gate(&mut gate, |g| g.error()).await;
    assert_eq!(g.phase, Phase::Errored);
    assert_eq!(h.backend.sync_calls(), 2);

    let users = h.backend.users().await;
    assert_eq!(users.len(), 1, "only u1's upsert reached storage");
    assert_eq!(users.first().map(|u| u.clerk_id.as_str()), Some("u1"));

    h.handle.shutdown().await;
}
