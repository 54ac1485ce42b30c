// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shared test harness: builds the gateway against a scripted stub backend
//! listening on an ephemeral local port, so the full client → refresh →
//! cookie flow is exercised over real sockets.

use auth_gateway::config::Config;
use auth_gateway::routes::create_router;
use auth_gateway::services::{AuthService, BackendClient};
use auth_gateway::AppState;
use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Handle to the stub backend's scripted state.
#[derive(Clone, Default)]
pub struct StubBackend {
    inner: Arc<Mutex<StubState>>,
}

#[derive(Debug)]
struct StubState {
    email: String,
    password: String,
    email_verified: bool,
    /// Token generation counter; tokens are "T{n}" / "R{n}"
    generation: u32,
    /// Access tokens the backend reports as expired
    expired_access: Vec<String>,
    /// Expire every freshly issued access token too (retry-exhaustion case)
    expire_after_refresh: bool,
    refresh_rejected: bool,
    logout_fails: bool,
    refresh_calls: u32,
    me_calls: u32,
    last_me_bearer: Option<String>,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            email: "user@test.com".to_string(),
            password: "password123".to_string(),
            email_verified: false,
            generation: 1,
            expired_access: Vec::new(),
            expire_after_refresh: false,
            refresh_rejected: false,
            logout_fails: false,
            refresh_calls: 0,
            me_calls: 0,
            last_me_bearer: None,
        }
    }
}

#[allow(dead_code)]
impl StubBackend {
    pub fn set_email_verified(&self, verified: bool) {
        self.inner.lock().unwrap().email_verified = verified;
    }

    /// Mark the currently issued access token as expired.
    pub fn expire_current_access_token(&self) {
        let mut s = self.inner.lock().unwrap();
        let token = format!("T{}", s.generation);
        s.expired_access.push(token);
    }

    /// Also expire every token issued by future refreshes.
    pub fn expire_tokens_after_refresh(&self) {
        self.inner.lock().unwrap().expire_after_refresh = true;
    }

    pub fn reject_refresh(&self) {
        self.inner.lock().unwrap().refresh_rejected = true;
    }

    pub fn fail_logout(&self) {
        self.inner.lock().unwrap().logout_fails = true;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.inner.lock().unwrap().refresh_calls
    }

    pub fn me_calls(&self) -> u32 {
        self.inner.lock().unwrap().me_calls
    }

    pub fn last_me_bearer(&self) -> Option<String> {
        self.inner.lock().unwrap().last_me_bearer.clone()
    }

    /// The currently valid (access, refresh) tokens.
    pub fn current_tokens(&self) -> (String, String) {
        let s = self.inner.lock().unwrap();
        (format!("T{}", s.generation), format!("R{}", s.generation))
    }

    fn token_pair(s: &StubState) -> Value {
        json!({
            "access_token": format!("T{}", s.generation),
            "refresh_token": format!("R{}", s.generation),
            "expires_in": 3600,
            "token_type": "Bearer",
        })
    }

    fn user(s: &StubState) -> Value {
        json!({
            "id": 1,
            "email": s.email,
            "first_name": "Test",
            "last_name": "User",
            "email_verified": s.email_verified,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn access_token_valid(s: &StubState, token: &str) -> bool {
    token == format!("T{}", s.generation) && !s.expired_access.iter().any(|t| t == token)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Token expired"})),
    )
        .into_response()
}

// ─── Stub backend handlers ───────────────────────────────────

async fn stub_login(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Response {
    let s = stub.inner.lock().unwrap();
    if body["email"] == json!(s.email) && body["password"] == json!(s.password) {
        Json(StubBackend::token_pair(&s)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn stub_register(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Response {
    let mut s = stub.inner.lock().unwrap();
    if body["email"] == json!(s.email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Email already exists"})),
        )
            .into_response();
    }
    s.email = body["email"].as_str().unwrap_or_default().to_string();
    s.email_verified = false;
    Json(StubBackend::token_pair(&s)).into_response()
}

async fn stub_refresh(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Response {
    let mut s = stub.inner.lock().unwrap();
    s.refresh_calls += 1;

    let presented = body["refresh_token"].as_str().unwrap_or_default();
    if s.refresh_rejected || presented != format!("R{}", s.generation) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid refresh token"})),
        )
            .into_response();
    }

    s.generation += 1;
    if s.expire_after_refresh {
        let token = format!("T{}", s.generation);
        s.expired_access.push(token);
    }
    Json(StubBackend::token_pair(&s)).into_response()
}

async fn stub_verify_email(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = stub.inner.lock().unwrap();
    match bearer_token(&headers) {
        Some(token) if access_token_valid(&s, &token) => {}
        _ => return unauthorized(),
    }

    if body["code"] == json!("123456") {
        s.email_verified = true;
        Json(json!({"verified": true})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid verification code"})),
        )
            .into_response()
    }
}

async fn stub_logout(State(stub): State<StubBackend>) -> Response {
    let s = stub.inner.lock().unwrap();
    if s.logout_fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "Logout failed"})),
        )
            .into_response();
    }
    Json(json!({})).into_response()
}

async fn stub_me(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    let mut s = stub.inner.lock().unwrap();
    s.me_calls += 1;
    let bearer = bearer_token(&headers);
    s.last_me_bearer = bearer.clone();

    match bearer {
        Some(token) if access_token_valid(&s, &token) => {
            Json(StubBackend::user(&s)).into_response()
        }
        _ => unauthorized(),
    }
}

async fn stub_posts_list(
    State(stub): State<StubBackend>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let s = stub.inner.lock().unwrap();
    match bearer_token(&headers) {
        Some(token) if access_token_valid(&s, &token) => {}
        _ => return unauthorized(),
    }
    Json(json!({
        "items": ["first", "second"],
        "query": query.unwrap_or_default(),
    }))
    .into_response()
}

async fn stub_posts_create(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let s = stub.inner.lock().unwrap();
    match bearer_token(&headers) {
        Some(token) if access_token_valid(&s, &token) => {}
        _ => return unauthorized(),
    }
    Json(json!({"id": 1, "title": body["title"]})).into_response()
}

async fn stub_enveloped() -> Json<Value> {
    // Already wrapped; the gateway must pass it through untouched
    Json(json!({"success": true, "data": {"n": 1}}))
}

async fn stub_teapot() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({"message": "I'm a teapot"})),
    )
        .into_response()
}

fn backend_router(stub: StubBackend) -> Router {
    Router::new()
        .route("/auth/login", post(stub_login))
        .route("/auth/register", post(stub_register))
        .route("/auth/refresh-token", post(stub_refresh))
        .route("/auth/register/verify-email", post(stub_verify_email))
        .route("/auth/logout", post(stub_logout))
        .route("/users/me", get(stub_me))
        .route("/posts", get(stub_posts_list).post(stub_posts_create))
        .route("/enveloped", get(stub_enveloped))
        .route("/teapot", get(stub_teapot))
        .with_state(stub)
}

// ─── Gateway factories ───────────────────────────────────────

#[allow(dead_code)]
pub async fn spawn_backend(stub: StubBackend) -> String {
    let app = backend_router(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub fn build_app(backend_url: &str) -> Router {
    let config = Config {
        backend_api_url: backend_url.to_string(),
        ..Default::default()
    };
    let backend = BackendClient::new(&config.backend_api_url);
    let auth = AuthService::new(backend);
    let state = Arc::new(AppState { config, auth });
    create_router(state)
}

/// Gateway wired to a live stub backend.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, StubBackend) {
    let stub = StubBackend::default();
    let backend_url = spawn_backend(stub.clone()).await;
    (build_app(&backend_url), stub)
}

/// Gateway pointed at a port nothing listens on.
#[allow(dead_code)]
pub async fn create_test_app_with_dead_backend() -> Router {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    build_app(&format!("http://{}", addr))
}

// ─── Response helpers ────────────────────────────────────────

#[allow(dead_code)]
pub fn session_cookie(access: &str, refresh: &str) -> String {
    format!("access_token={}; refresh_token={}", access, refresh)
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
