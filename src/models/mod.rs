// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod envelope;
pub mod tokens;
pub mod user;

pub use envelope::ApiEnvelope;
pub use tokens::TokenPair;
pub use user::{LoginRequest, RegisterRequest, User, VerifyEmailRequest};
