// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Services module - token lifecycle and backend access.

pub mod auth;
pub mod backend;

pub use auth::AuthService;
pub use backend::BackendClient;
