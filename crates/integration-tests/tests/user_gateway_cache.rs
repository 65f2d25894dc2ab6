//! User gateway caching and invalidation behavior.

#![allow(clippy::unwrap_used)]

use outlay_integration_tests::backend::TestBackend;
use outlay_integration_tests::{identity, test_config};
use outlay_shell::api::{ApiClient, ApiError};
use outlay_shell::backend::{SyncPayload, UserGateway};

async fn spawn_gateway() -> (TestBackend, UserGateway) {
    let backend = TestBackend::spawn().await;
    let config = test_config(&backend.base_url);
    let api = ApiClient::new(&config).expect("client");
    let gateway = UserGateway::new(api, config.user_cache_ttl);
    (backend, gateway)
}

#[tokio::test]
async fn list_is_cached_until_a_sync_invalidates_it() {
    let (backend, gateway) = spawn_gateway().await;

    let first = gateway.list_users(None).await.expect("list");
    assert!(first.is_empty());

    let second = gateway.list_users(None).await.expect("list");
    assert!(second.is_empty());
    assert_eq!(backend.list_calls(), 1, "second read served from cache");

    let payload = SyncPayload::for_identity(&identity("user_1", Some("a@b.com"))).expect("payload");
    let user = gateway.sync_user(&payload, None).await.expect("sync");
    assert_eq!(user.clerk_id.as_str(), "user_1");

    let after = gateway.list_users(None).await.expect("list");
    assert_eq!(after.len(), 1);
    assert_eq!(backend.list_calls(), 2, "sync invalidated the cached list");
}

#[tokio::test]
async fn explicit_invalidation_forces_a_refetch() {
    let (backend, gateway) = spawn_gateway().await;

    let _ = gateway.list_users(None).await.expect("list");
    gateway.invalidate_users().await;
    let _ = gateway.list_users(None).await.expect("list");

    assert_eq!(backend.list_calls(), 2);
}

#[tokio::test]
async fn repeated_sync_upserts_a_single_record() {
    let (backend, gateway) = spawn_gateway().await;

    let payload = SyncPayload::for_identity(&identity("user_1", Some("a@b.com"))).expect("payload");
    let created = gateway.sync_user(&payload, None).await.expect("sync");
    let updated = gateway.sync_user(&payload, None).await.expect("sync");

    assert_eq!(created.id, updated.id, "server upserts by external id");
    assert_eq!(backend.users().await.len(), 1);
}

#[tokio::test]
async fn sync_failure_surfaces_the_backend_message() {
    let (backend, gateway) = spawn_gateway().await;
    backend.fail_sync(true);

    let payload = SyncPayload::for_identity(&identity("user_1", Some("a@b.com"))).expect("payload");
    let err = gateway.sync_user(&payload, None).await.expect_err("must fail");

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "sync exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}
