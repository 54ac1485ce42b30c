// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Token pair issued by the backend on login, registration and refresh.

use serde::{Deserialize, Serialize};

/// Lifetime of the refresh-token cookie (30 days).
pub const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Access/refresh token pair as returned by the backend.
///
/// A pair is never mutated: refresh supersedes the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds
    pub expires_in: u64,
    pub token_type: String,
}
