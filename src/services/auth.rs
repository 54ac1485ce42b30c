// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Token-lifecycle service on top of the backend client.
//!
//! Handles:
//! - Auth operations (login, register, verify, logout, profile)
//! - Expiry detection from the response envelope
//! - Single-flight token refresh with exactly one replay per request

use crate::error::AppError;
use crate::models::{ApiEnvelope, LoginRequest, RegisterRequest, TokenPair, User};
use crate::services::backend::{paths, BackendClient};
use crate::session::SessionTokens;
use axum::body::Bytes;
use axum::http::Method;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// How long a failed exchange stays published. Long enough to absorb the
/// concurrent burst that detected the same expiry, short enough that a
/// backend hiccup does not condemn the session for good.
const FAILED_REFRESH_TTL: Duration = Duration::from_secs(30);

/// Per-refresh-token mutex serializing the exchange.
type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Published outcomes keyed by the refresh token that was exchanged, so
/// concurrent callers holding the same retired token reuse the winner's
/// answer instead of racing the backend. Failures are published too.
type RefreshResults = Arc<DashMap<String, CachedRefresh>>;

struct CachedRefresh {
    outcome: Result<TokenPair, ()>,
    stored_at: Instant,
}

impl CachedRefresh {
    /// A published pair stays usable as long as its access token; a
    /// published failure only until [`FAILED_REFRESH_TTL`] passes.
    fn is_fresh(&self) -> bool {
        let ttl = match &self.outcome {
            Ok(pair) => Duration::from_secs(pair.expires_in),
            Err(()) => FAILED_REFRESH_TTL,
        };
        self.stored_at.elapsed() < ttl
    }
}

/// High-level auth service owning the token refresh flow.
///
/// Requests made through this service detect an expired access token from
/// the normalized envelope, refresh once, and replay the original request
/// exactly once with the new token. The rotated pair is handed back to the
/// caller so it can be persisted into the session store.
#[derive(Clone)]
pub struct AuthService {
    backend: BackendClient,
    refresh_locks: RefreshLocks,
    refresh_results: RefreshResults,
}

impl AuthService {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            refresh_locks: Arc::new(DashMap::new()),
            refresh_results: Arc::new(DashMap::new()),
        }
    }

    // ─── Auth operations ─────────────────────────────────────

    /// Exchange credentials for a token pair. No bearer, no refresh.
    pub async fn login(
        &self,
        credentials: &LoginRequest,
    ) -> Result<ApiEnvelope<TokenPair>, AppError> {
        self.backend.login(credentials).await
    }

    /// Register a new account.
    pub async fn register(
        &self,
        data: &RegisterRequest,
    ) -> Result<ApiEnvelope<TokenPair>, AppError> {
        self.backend.register(data).await
    }

    /// Submit the email verification code for the current session.
    pub async fn verify_email(
        &self,
        code: &str,
        session: &SessionTokens,
    ) -> Result<(ApiEnvelope<Value>, Option<TokenPair>), AppError> {
        let body = serde_json::json!({ "code": code });
        self.authorized_request(session, Method::POST, paths::VERIFY_EMAIL, Some(&body))
            .await
    }

    /// Invalidate the session on the backend. Callers clear the cookies
    /// regardless of the outcome.
    pub async fn logout(&self, session: &SessionTokens) -> Result<ApiEnvelope<Value>, AppError> {
        self.backend.logout(session.access_token.as_deref()).await
    }

    /// Fetch the current user's profile, refreshing the session if needed.
    pub async fn current_user(
        &self,
        session: &SessionTokens,
    ) -> Result<(ApiEnvelope<User>, Option<TokenPair>), AppError> {
        let (envelope, rotated) = self
            .authorized_request(session, Method::GET, paths::ME, None)
            .await?;
        Ok((envelope.decode()?, rotated))
    }

    // ─── Authorized requests ─────────────────────────────────

    /// Send a JSON request with the session's bearer token, refreshing and
    /// replaying at most once on an expired-token answer.
    ///
    /// Returns the final envelope plus the rotated pair when a refresh
    /// happened, so the caller can persist the new cookies.
    pub async fn authorized_request(
        &self,
        session: &SessionTokens,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(ApiEnvelope<Value>, Option<TokenPair>), AppError> {
        let envelope = self
            .backend
            .send(method.clone(), path, body, session.access_token.as_deref())
            .await?;

        if !envelope.is_auth_expired() {
            return Ok((envelope, None));
        }

        let pair = self.refresh_from(session).await?;

        // Replay exactly once with the refreshed token. A second auth
        // failure is terminal for this request and surfaces as-is.
        let retried = self
            .backend
            .send(method, path, body, Some(&pair.access_token))
            .await?;

        Ok((retried, Some(pair)))
    }

    /// Raw-body variant of [`Self::authorized_request`] for the proxy.
    pub async fn forward(
        &self,
        session: &SessionTokens,
        method: Method,
        path_and_query: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(ApiEnvelope<Value>, Option<TokenPair>), AppError> {
        let envelope = self
            .backend
            .send_raw(
                method.clone(),
                path_and_query,
                body.clone(),
                content_type,
                session.access_token.as_deref(),
            )
            .await?;

        if !envelope.is_auth_expired() {
            return Ok((envelope, None));
        }

        let pair = self.refresh_from(session).await?;
        let retried = self
            .backend
            .send_raw(
                method,
                path_and_query,
                body,
                content_type,
                Some(&pair.access_token),
            )
            .await?;

        Ok((retried, Some(pair)))
    }

    async fn refresh_from(&self, session: &SessionTokens) -> Result<TokenPair, AppError> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or(AppError::SessionExpired)?;
        self.refresh_session(refresh_token).await
    }

    // ─── Single-flight refresh ───────────────────────────────

    /// Exchange a refresh token for a new pair, at most once per token.
    ///
    /// The first caller performs the exchange and publishes the outcome,
    /// success or failure; concurrent callers holding the same token wait
    /// on the lock and reuse whatever was published. Exactly one backend
    /// call happens per expired pair, even when the refresh is rejected.
    /// Any failure means the session is gone and the store must be cleared.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        // Fast path: a concurrent caller already exchanged this token.
        if let Some(outcome) = self.published_outcome(refresh_token) {
            return outcome;
        }

        let lock = self
            .refresh_locks
            .entry(refresh_token.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: the winner may have finished
        // while we were waiting.
        if let Some(outcome) = self.published_outcome(refresh_token) {
            return outcome;
        }

        tracing::info!("Access token expired, refreshing");

        let outcome = self.exchange(refresh_token).await;

        self.refresh_results.insert(
            refresh_token.to_string(),
            CachedRefresh {
                outcome: outcome.clone(),
                stored_at: Instant::now(),
            },
        );
        // Waiters already hold their own handle to the mutex; latecomers
        // are served from the published outcome.
        self.refresh_locks.remove(refresh_token);

        outcome.map_err(|()| AppError::SessionExpired)
    }

    /// One backend exchange. The error carries no detail: every failure
    /// mode ends the session the same way.
    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair, ()> {
        let envelope = match self.backend.refresh_token(refresh_token).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed in transit");
                return Err(());
            }
        };

        if !envelope.success {
            tracing::warn!(error = ?envelope.error, "Token refresh rejected by backend");
            return Err(());
        }

        match envelope.data {
            Some(pair) => {
                tracing::info!("Token refreshed");
                Ok(pair)
            }
            None => Err(()),
        }
    }

    /// Look up a still-fresh published outcome, evicting the entry once
    /// the pair it carries has itself expired. Eviction on read keeps both
    /// maps bounded by the number of live sessions.
    fn published_outcome(&self, refresh_token: &str) -> Option<Result<TokenPair, AppError>> {
        let entry = self.refresh_results.get(refresh_token)?;
        if entry.is_fresh() {
            return Some(entry.outcome.clone().map_err(|()| AppError::SessionExpired));
        }
        drop(entry);
        self.refresh_results.remove(refresh_token);
        None
    }
}
