// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Page routes.
//!
//! Placeholder markup only; the route guard layered over these routes in
//! `routes/mod.rs` is what matters here.

use crate::AppState;
use axum::{response::Html, routing::get, Router};
use std::sync::Arc;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const VERIFY: &str = "/verify";
pub const DASHBOARD: &str = "/dashboard";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(HOME, get(home))
        .route(LOGIN, get(login))
        .route(REGISTER, get(register))
        .route(VERIFY, get(verify))
        .route(DASHBOARD, get(dashboard))
}

async fn home() -> Html<&'static str> {
    Html("<!doctype html><title>Home</title><h1>Home</h1>")
}

async fn login() -> Html<&'static str> {
    Html("<!doctype html><title>Login</title><h1>Login</h1>")
}

async fn register() -> Html<&'static str> {
    Html("<!doctype html><title>Register</title><h1>Register</h1>")
}

async fn verify() -> Html<&'static str> {
    Html("<!doctype html><title>Verify your email</title><h1>Verify your email</h1>")
}

async fn dashboard() -> Html<&'static str> {
    Html("<!doctype html><title>Dashboard</title><h1>Dashboard</h1>")
}
