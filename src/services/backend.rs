// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Backend API client.
//!
//! Wraps reqwest and normalizes every backend answer into the uniform
//! [`ApiEnvelope`]:
//! - well-formed non-2xx responses become `{success:false, error, code}`
//! - bare 2xx payloads are wrapped as `{success:true, data}`
//! - already-enveloped payloads pass through unchanged
//!
//! Only transport-level problems (connect failure, malformed JSON) surface
//! as an `Err`.

use crate::error::AppError;
use crate::models::{ApiEnvelope, LoginRequest, RegisterRequest, TokenPair};
use axum::body::Bytes;
use axum::http::Method;
use serde_json::Value;

/// Backend REST paths consumed by this service.
pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const VERIFY_EMAIL: &str = "/auth/register/verify-email";
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
    pub const LOGOUT: &str = "/auth/logout";
    pub const ME: &str = "/users/me";
}

/// HTTP client for the external backend API.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new client for the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Send a JSON request and normalize the response.
    ///
    /// `bearer` is attached as an `Authorization` header when present;
    /// login and refresh calls pass `None`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<ApiEnvelope<Value>, AppError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, url = %url, "Backend request");

        let mut request = self.http.request(method, &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            // .json() sets the JSON content type
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        self.normalize(path, response).await
    }

    /// Forward a raw body, preserving the caller's content type.
    ///
    /// Used by the proxy so multipart and other non-JSON payloads travel
    /// through untouched.
    pub async fn send_raw(
        &self,
        method: Method,
        path_and_query: &str,
        body: Bytes,
        content_type: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<ApiEnvelope<Value>, AppError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::debug!(method = %method, url = %url, "Backend request (forwarded)");

        let mut request = self.http.request(method, &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if !body.is_empty() {
            let ct = content_type.unwrap_or("application/json");
            request = request
                .header(reqwest::header::CONTENT_TYPE, ct)
                .body(body.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        self.normalize(path_and_query, response).await
    }

    /// Normalize a backend response into the envelope shape.
    async fn normalize(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<Value>, AppError> {
        let status = response.status();
        tracing::debug!(status = %status, path, "Backend response");

        if !status.is_success() {
            // A non-2xx with a body is a backend answer, not a failure:
            // capture its message and status into the envelope.
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| body.get("error").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

            return Ok(ApiEnvelope::err(message, Some(status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))?;

        // Backends that already wrap in a success/data structure pass
        // through; bare payloads get wrapped for a consistent interface.
        if body.get("success").is_some() {
            serde_json::from_value(body)
                .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))
        } else {
            Ok(ApiEnvelope::ok(body))
        }
    }

    // ─── Typed auth calls ────────────────────────────────────

    /// Exchange credentials for a token pair.
    pub async fn login(
        &self,
        credentials: &LoginRequest,
    ) -> Result<ApiEnvelope<TokenPair>, AppError> {
        let body = serde_json::to_value(credentials).map_err(anyhow::Error::from)?;
        self.send(Method::POST, paths::LOGIN, Some(&body), None)
            .await?
            .decode()
    }

    /// Register a new account; the backend answers with a token pair.
    pub async fn register(
        &self,
        data: &RegisterRequest,
    ) -> Result<ApiEnvelope<TokenPair>, AppError> {
        let body = serde_json::to_value(data).map_err(anyhow::Error::from)?;
        self.send(Method::POST, paths::REGISTER, Some(&body), None)
            .await?
            .decode()
    }

    /// Exchange a refresh token for a new pair.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ApiEnvelope<TokenPair>, AppError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.send(Method::POST, paths::REFRESH_TOKEN, Some(&body), None)
            .await?
            .decode()
    }

    /// Invalidate the session on the backend side.
    pub async fn logout(&self, bearer: Option<&str>) -> Result<ApiEnvelope<Value>, AppError> {
        let body = serde_json::json!({});
        self.send(Method::POST, paths::LOGOUT, Some(&body), bearer)
            .await
    }
}
