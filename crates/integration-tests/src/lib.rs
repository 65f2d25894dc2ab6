//! Integration tests for Outlay.
//!
//! The shell talks to an in-process axum backend implementing the
//! `GET`/`POST /api/v1/users` surface, and observes session snapshots from a
//! scripted in-memory identity provider. No external services are required.
//!
//! Run with: `cargo test -p outlay-integration-tests`

#![allow(clippy::unwrap_used)]

pub mod backend;
pub mod provider;

use std::time::Duration;

use tokio::sync::watch;
use url::Url;

use outlay_core::IdentityId;
use outlay_shell::config::ShellConfig;
use outlay_shell::identity::Identity;
use outlay_shell::reconcile::Gate;

/// Shell configuration pointed at an in-process backend.
#[must_use]
pub fn test_config(base_url: &str) -> ShellConfig {
    ShellConfig {
        api_url: Url::parse(base_url).expect("valid base url"),
        api_timeout: Duration::from_secs(30),
        user_cache_ttl: Duration::from_secs(300),
        service_token: None,
        sentry_dsn: None,
    }
}

/// Identity snapshot for tests.
#[must_use]
pub fn identity(id: &str, email: Option<&str>) -> Identity {
    Identity {
        id: IdentityId::new(id),
        primary_email: email.map(str::to_string),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        image_url: None,
    }
}

/// Wait until the gate satisfies `pred`, returning the matching value.
///
/// # Panics
///
/// Panics after five seconds without a match.
pub async fn wait_for_gate(
    rx: &mut watch::Receiver<Gate>,
    pred: impl Fn(&Gate) -> bool,
) -> Gate {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let gate = *rx.borrow_and_update();
            if pred(&gate) {
                return gate;
            }
            rx.changed().await.expect("gate channel closed");
        }
    })
    .await
    .expect("timed out waiting for gate")
}

/// Wait until `pred` holds.
///
/// # Panics
///
/// Panics after five seconds without the condition holding.
pub async fn wait_until(pred: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
