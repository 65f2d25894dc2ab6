//! In-process axum backend implementing the user API surface.
//!
//! Serves `GET`/`POST /api/v1/users` with upsert-by-`clerk_id` semantics,
//! plus a handful of `/test/*` routes exercising the HTTP client contract.
//! Tests can inject failures, hold sync calls open, and inspect what the
//! shell actually sent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use outlay_core::UserId;
use outlay_shell::backend::{SyncPayload, SyncedUser};

/// What the echo route reports back about a request.
#[derive(Debug, Serialize, Deserialize)]
pub struct EchoReply {
    pub method: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body_len: usize,
}

struct BackendControl {
    users: Mutex<Vec<SyncedUser>>,
    fail_sync: AtomicBool,
    hold_tx: watch::Sender<bool>,
    list_calls: AtomicUsize,
    sync_calls: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
}

/// Handle to a running in-process backend.
pub struct TestBackend {
    pub base_url: String,
    control: Arc<BackendControl>,
}

impl TestBackend {
    /// Bind on an ephemeral port and serve the user API.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let (hold_tx, _) = watch::channel(false);
        let control = Arc::new(BackendControl {
            users: Mutex::new(Vec::new()),
            fail_sync: AtomicBool::new(false),
            hold_tx,
            list_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/v1/users", get(list_users).post(sync_user))
            .route("/test/no-content", get(no_content))
            .route("/test/empty", get(empty_body))
            .route("/test/malformed", get(malformed_json))
            .route("/test/error-json", get(error_json))
            .route("/test/error-plain", get(error_plain))
            .route("/test/echo", get(echo))
            .with_state(Arc::clone(&control));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test backend");
        });

        Self {
            base_url: format!("http://{addr}"),
            control,
        }
    }

    /// Make subsequent sync calls fail with a 500.
    pub fn fail_sync(&self, fail: bool) {
        self.control.fail_sync.store(fail, Ordering::SeqCst);
    }

    /// Hold sync calls open until released with `hold_sync(false)`.
    pub fn hold_sync(&self, hold: bool) {
        let _ = self.control.hold_tx.send(hold);
    }

    /// Number of sync (POST) calls received.
    #[must_use]
    pub fn sync_calls(&self) -> usize {
        self.control.sync_calls.load(Ordering::SeqCst)
    }

    /// Number of list (GET) calls received.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.control.list_calls.load(Ordering::SeqCst)
    }

    /// Authorization header of the most recent user API request.
    pub async fn last_authorization(&self) -> Option<String> {
        self.control.last_authorization.lock().await.clone()
    }

    /// Stored user records.
    pub async fn users(&self) -> Vec<SyncedUser> {
        self.control.users.lock().await.clone()
    }
}

async fn record_authorization(control: &BackendControl, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *control.last_authorization.lock().await = auth;
}

async fn list_users(
    State(control): State<Arc<BackendControl>>,
    headers: HeaderMap,
) -> Json<Vec<SyncedUser>> {
    control.list_calls.fetch_add(1, Ordering::SeqCst);
    record_authorization(&control, &headers).await;

    Json(control.users.lock().await.clone())
}

async fn sync_user(
    State(control): State<Arc<BackendControl>>,
    headers: HeaderMap,
    Json(payload): Json<SyncPayload>,
) -> Response {
    control.sync_calls.fetch_add(1, Ordering::SeqCst);
    record_authorization(&control, &headers).await;

    // Outcome is fixed at entry; a failure toggled while this call is held
    // does not affect it.
    let fail = control.fail_sync.load(Ordering::SeqCst);

    let mut hold_rx = control.hold_tx.subscribe();
    loop {
        let held = *hold_rx.borrow_and_update();
        if !held {
            break;
        }
        if hold_rx.changed().await.is_err() {
            break;
        }
    }

    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": "sync exploded" })),
        )
            .into_response();
    }

    let mut users = control.users.lock().await;
    let now = Utc::now();

    if let Some(existing) = users.iter_mut().find(|u| u.clerk_id == payload.clerk_id) {
        existing.email = payload.email;
        existing.first_name = payload.first_name;
        existing.last_name = payload.last_name;
        existing.image_url = payload.image_url;
        existing.updated_at = now;
        return Json(existing.clone()).into_response();
    }

    let user = SyncedUser {
        id: UserId::new(Uuid::new_v4()),
        clerk_id: payload.clerk_id,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        image_url: payload.image_url,
        created_at: now,
        updated_at: now,
    };
    users.push(user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn empty_body() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], "").into_response()
}

async fn malformed_json() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], "not json").into_response()
}

async fn error_json() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "message": "email is required" })),
    )
        .into_response()
}

async fn error_plain() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream down").into_response()
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<EchoReply> {
    let header_string = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(EchoReply {
        method: method.to_string(),
        content_type: header_string(header::CONTENT_TYPE),
        authorization: header_string(header::AUTHORIZATION),
        body_len: body.len(),
    })
}
