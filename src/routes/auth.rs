// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session-managing auth routes.
//!
//! These endpoints own the token cookies: they exchange credentials or a
//! refresh token with the backend and translate the result into
//! `Set-Cookie` headers plus an envelope body. Backend business failures
//! come back as `{success:false}` envelopes, never as transport errors.

use crate::error::{AppError, Result};
use crate::models::{ApiEnvelope, LoginRequest, RegisterRequest, VerifyEmailRequest};
use crate::session::{CookieSessionStore, SessionStore, SessionTokens};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/register/verify-email", post(verify_email))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/logout", post(logout))
}

/// Log in: exchange credentials, persist the pair, return the profile.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<LoginRequest>,
) -> Result<Response> {
    let envelope = state.auth.login(&credentials).await?;

    let pair = if envelope.success { envelope.data } else { None };
    let Some(pair) = pair else {
        tracing::warn!(email = %credentials.email, "Login rejected by backend");
        let error = envelope.error.unwrap_or_else(|| "Login failed".to_string());
        return Ok(Json(ApiEnvelope::<Value>::err(error, envelope.code)).into_response());
    };

    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    store.store(&pair);

    // Pull the profile with the fresh token so the client learns the
    // verification status in the same round trip.
    let session = SessionTokens::from(&pair);
    let (user_envelope, _) = state.auth.current_user(&session).await?;

    if !user_envelope.success {
        let error = user_envelope
            .error
            .unwrap_or_else(|| "Failed to fetch user profile".to_string());
        return Ok((
            store.into_jar(),
            Json(ApiEnvelope::<Value>::err(error, user_envelope.code)),
        )
            .into_response());
    }

    tracing::info!(email = %credentials.email, "Login successful");
    Ok((store.into_jar(), Json(user_envelope)).into_response())
}

/// Register a new account and persist the issued pair.
///
/// The tokens live only in the cookies; the body carries a bare success.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(data): Json<RegisterRequest>,
) -> Result<Response> {
    let envelope = state.auth.register(&data).await?;

    let pair = if envelope.success { envelope.data } else { None };
    let Some(pair) = pair else {
        tracing::warn!(email = %data.email, "Registration rejected by backend");
        let error = envelope
            .error
            .unwrap_or_else(|| "Registration failed".to_string());
        return Ok(Json(ApiEnvelope::<Value>::err(error, envelope.code)).into_response());
    };

    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    store.store(&pair);

    tracing::info!(email = %data.email, "Registration successful");
    Ok((store.into_jar(), Json(ApiEnvelope::ok(json!({})))).into_response())
}

/// Submit the verification code for the current session.
async fn verify_email(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Response> {
    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    let session = store.load();

    if !session.is_authenticated() {
        return Err(AppError::Unauthorized);
    }

    match state.auth.verify_email(&body.code, &session).await {
        Ok((envelope, rotated)) => {
            if let Some(pair) = rotated {
                store.store(&pair);
            }
            Ok((store.into_jar(), Json(envelope)).into_response())
        }
        Err(AppError::SessionExpired) => {
            store.clear();
            Ok((
                StatusCode::UNAUTHORIZED,
                store.into_jar(),
                Json(ApiEnvelope::<Value>::err("Session expired", Some(401))),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

/// Rotate the session using the refresh cookie.
async fn refresh_token(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    let session = store.load();

    let Some(refresh) = session.refresh_token else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(ApiEnvelope::<Value>::err(
                "No refresh token available",
                Some(401),
            )),
        )
            .into_response());
    };

    match state.auth.refresh_session(&refresh).await {
        Ok(pair) => {
            store.store(&pair);
            Ok((store.into_jar(), Json(ApiEnvelope::ok(json!({})))).into_response())
        }
        Err(AppError::SessionExpired) => {
            // A dead refresh token empties the session entirely
            store.clear();
            Ok((
                StatusCode::UNAUTHORIZED,
                store.into_jar(),
                Json(ApiEnvelope::<Value>::err("Token refresh failed", Some(401))),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

/// Log out: tell the backend, then drop the cookies unconditionally.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    let session = store.load();

    match state.auth.logout(&session).await {
        Ok(envelope) if !envelope.success => {
            tracing::warn!(error = ?envelope.error, "Backend logout failed")
        }
        Err(err) => tracing::warn!(error = %err, "Backend logout unreachable"),
        Ok(_) => {}
    }

    // Cookies go away no matter what the backend said
    store.clear();
    (store.into_jar(), Json(ApiEnvelope::<Value>::ok(json!({})))).into_response()
}
