// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Application error types with consistent API responses.
//!
//! Business failures reported by the backend never become an `AppError`;
//! they travel inside the response envelope. This type covers the cases
//! where no usable backend answer exists: transport failures, exhausted
//! sessions, and bad input.

use crate::models::ApiEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend transport error: {0}")]
    Transport(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AppError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AppError::BadRequest(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiEnvelope::<Value>::err(msg.clone(), Some(400))),
                )
                    .into_response();
            }
            AppError::Transport(msg) => {
                tracing::error!(error = %msg, "Backend transport error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request")
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = ApiEnvelope::<Value>::err(message, Some(status.as_u16()));
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
