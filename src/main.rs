// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Auth-Gateway Server
//!
//! Sits between the browser and the external account backend: holds the
//! token cookies, guards page navigations, and proxies `/api/*` calls.

use auth_gateway::{
    config::Config,
    services::{AuthService, BackendClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        backend = %config.backend_api_url,
        "Starting Auth-Gateway"
    );

    // Backend API client and the token-lifecycle service built on it
    let backend = BackendClient::new(&config.backend_api_url);
    let auth = AuthService::new(backend);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth,
    });

    // Build router
    let app = auth_gateway::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auth_gateway=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
