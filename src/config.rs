// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external backend API (e.g. `http://127.0.0.1:8000/api`)
    pub backend_api_url: String,
    /// Origin the browser app is served from, used for CORS
    pub public_origin: String,
    /// Server port
    pub port: u16,
    /// Whether session cookies carry the `Secure` attribute (production)
    pub secure_cookies: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_api_url: "http://127.0.0.1:8000/api".to_string(),
            public_origin: "http://localhost:8080".to_string(),
            port: 8080,
            secure_cookies: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_api_url: env::var("BACKEND_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_API_URL"))?,
            public_origin: env::var("PUBLIC_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            // Secure cookies everywhere except local development
            secure_cookies: env::var("ENVIRONMENT")
                .map(|v| v == "production")
                .unwrap_or(false),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
