//! In-process mock of the loyalty REST API.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use loyalty_client::{ApiClient, MemoryStorage, SessionStore};

/// How `POST /auth/refresh` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Issue `access-2`/`refresh-2` and start accepting `access-2`.
    Rotate,
    /// Answer 401.
    Reject,
    /// Answer 200 without an access token.
    MissingAccess,
    /// Issue a token the API will still reject.
    IssueStale,
    /// Drop the connection without answering.
    Hangup,
}

pub struct MockApi {
    refresh_calls: AtomicUsize,
    secure_calls: AtomicUsize,
    me_calls: AtomicUsize,
    valid_access: Mutex<String>,
    refresh_mode: Mutex<RefreshMode>,
    role: Mutex<String>,
    last_refresh_presented: Mutex<Option<String>>,
}

impl MockApi {
    fn new() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            secure_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            valid_access: Mutex::new("access-1".to_string()),
            refresh_mode: Mutex::new(RefreshMode::Rotate),
            role: Mutex::new("CLIENT".to_string()),
            last_refresh_presented: Mutex::new(None),
        }
    }

    pub fn accept_access(&self, token: &str) {
        *self.valid_access.lock().unwrap() = token.to_string();
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn set_role(&self, role: &str) {
        *self.role.lock().unwrap() = role.to_string();
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn secure_calls(&self) -> usize {
        self.secure_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn last_refresh_presented(&self) -> Option<String> {
        self.last_refresh_presented.lock().unwrap().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_access.lock().unwrap());
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
        .into_response()
}

async fn refresh(State(mock): State<Arc<MockApi>>, Json(body): Json<Value>) -> Response {
    mock.refresh_calls.fetch_add(1, Ordering::SeqCst);
    *mock.last_refresh_presented.lock().unwrap() =
        body.get("refresh").and_then(Value::as_str).map(str::to_string);

    let mode = *mock.refresh_mode.lock().unwrap();
    match mode {
        RefreshMode::Rotate => {
            mock.accept_access("access-2");
            Json(json!({ "access": "access-2", "refresh": "refresh-2" })).into_response()
        }
        RefreshMode::Reject => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token expired" })),
        )
            .into_response(),
        RefreshMode::MissingAccess => Json(json!({ "refresh": "refresh-9" })).into_response(),
        RefreshMode::IssueStale => {
            Json(json!({ "access": "stale", "refresh": "refresh-2" })).into_response()
        }
        // Unwinding out of the handler makes hyper close the connection.
        RefreshMode::Hangup => panic!("refresh connection dropped"),
    }
}

async fn me(
    State(mock): State<Arc<MockApi>>,
    Path(tenant): Path<String>,
    headers: HeaderMap,
) -> Response {
    mock.me_calls.fetch_add(1, Ordering::SeqCst);
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    let role = mock.role.lock().unwrap().clone();
    Json(json!({
        "id": 7,
        "email": format!("user@{tenant}.test"),
        "phone": null,
        "phone_verified": false,
        "email_verified": true,
        "role": role,
    }))
    .into_response()
}

async fn login(Path(tenant): Path<String>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some("cashier@demo.test") || password != Some("secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials", "code": "INVALID_CREDENTIALS" })),
        )
            .into_response();
    }
    Json(json!({
        "user": {
            "id": 3,
            "email": format!("cashier@{tenant}.test"),
            "phone": null,
            "phone_verified": false,
            "email_verified": true,
            "role": "CASHIER",
        },
        "tokens": { "access": "access-1", "refresh": "refresh-1" },
    }))
    .into_response()
}

async fn secure(State(mock): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    mock.secure_calls.fetch_add(1, Ordering::SeqCst);
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "ok": true })).into_response()
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": auth }))
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn failing() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "message": "Not enough points", "code": "INSUFFICIENT_POINTS" })),
    )
        .into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

pub struct TestServer {
    /// API base including the `/api/v1` prefix.
    pub base_url: String,
    pub mock: Arc<MockApi>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let mock = Arc::new(MockApi::new());

        let api = Router::new()
            .route("/auth/refresh", post(refresh))
            .route("/:tenant/auth/me", get(me))
            .route("/:tenant/auth/login", post(login))
            .route("/secure", get(secure))
            .route("/echo-auth", get(echo_auth))
            .route("/empty", get(empty))
            .route("/failing", get(failing));

        let app = Router::new()
            .route("/healthz", get(healthz))
            .nest("/api/v1", api)
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}/api/v1");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            mock,
            handle,
        }
    }

    /// A client over a fresh in-memory session. The storage handle is
    /// returned so tests can inspect what was persisted.
    pub fn client(&self) -> (ApiClient, Arc<SessionStore>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let session = Arc::new(SessionStore::open(Arc::new(storage.clone())));
        let client = ApiClient::new(self.base_url.clone(), session.clone());
        (client, session, storage)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
