// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Auth-Gateway: session-holding front end for the account backend
//!
//! This crate provides the backend-for-frontend service that owns the
//! browser session: login/registration/verification flows, token cookies,
//! page-navigation guarding, and a pass-through `/api/*` proxy to the
//! external backend API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;

use config::Config;
use services::AuthService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
}
