// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Backend-For-Frontend proxy.
//!
//! Forwards same-origin `/api/*` calls to the backend with the caller's
//! session attached, so browser code never holds tokens directly. The
//! answer is always an envelope; transport failure maps to HTTP 500 with
//! `{success:false}`.

use crate::error::AppError;
use crate::models::ApiEnvelope;
use crate::session::{CookieSessionStore, SessionStore};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/{*path}",
        get(proxy).post(proxy).put(proxy).delete(proxy),
    )
}

/// Forward one request, replaying once through the refresh flow on an
/// expired token. Rotated cookies ride back on the response.
async fn proxy(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut target = format!("/{}", path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    let session = store.load();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match state
        .auth
        .forward(&session, method, &target, body, content_type.as_deref())
        .await
    {
        Ok((envelope, rotated)) => {
            if let Some(pair) = rotated {
                store.store(&pair);
            }
            (store.into_jar(), Json(envelope)).into_response()
        }
        Err(AppError::SessionExpired) => {
            store.clear();
            (
                StatusCode::UNAUTHORIZED,
                store.into_jar(),
                Json(ApiEnvelope::<Value>::err("Session expired", Some(401))),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, path = %target, "API proxy error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiEnvelope::<Value>::err(
                    "Failed to process request",
                    Some(500),
                )),
            )
                .into_response()
        }
    }
}
