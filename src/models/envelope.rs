// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Uniform response envelope shared by every backend call.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Uniform shape every backend response is normalized into, regardless of
/// what the backend actually returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope wrapping `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    /// Failed envelope carrying the backend's (or our own) error message.
    pub fn err(error: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            code,
        }
    }

    /// Whether this response reports an expired or rejected access token.
    pub fn is_auth_expired(&self) -> bool {
        !self.success
            && (self.code == Some(401) || self.error.as_deref() == Some("Token expired"))
    }
}

impl ApiEnvelope<Value> {
    /// Reinterpret the payload of a raw envelope as a typed one.
    ///
    /// Only successful payloads are decoded; error envelopes pass through
    /// with their message and code intact.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiEnvelope<T>, AppError> {
        let data = match self.data {
            Some(value) if self.success => Some(
                serde_json::from_value(value)
                    .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))?,
            ),
            _ => None,
        };

        Ok(ApiEnvelope {
            success: self.success,
            data,
            error: self.error,
            code: self.code,
        })
    }
}
