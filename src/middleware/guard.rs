// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Route guard middleware for page navigations.
//!
//! Layered over the page routes only; `/api/*`, `/auth/*` and `/health`
//! are never guarded. Each navigation is classified into exactly one route
//! class before any redirect decision is made.

use crate::error::AppError;
use crate::routes::pages;
use crate::session::{CookieSessionStore, SessionStore};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// How a page path relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a session (login, register)
    Public,
    /// Needs a session but not a verified email (the verify page)
    Verify,
    /// Needs a session with a verified email (everything else)
    Protected,
}

/// Classify a page path. Every path lands in exactly one class.
pub fn classify(path: &str) -> RouteClass {
    match path {
        pages::LOGIN | pages::REGISTER => RouteClass::Public,
        pages::VERIFY => RouteClass::Verify,
        _ => RouteClass::Protected,
    }
}

/// Guard a page navigation, redirecting according to session state.
///
/// "Authenticated" here means a token cookie is present; whether the token
/// is actually still good is the backend's call, made via the profile
/// fetch below.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let class = classify(&path);

    let mut store = CookieSessionStore::new(jar, state.config.secure_cookies);
    let session = store.load();

    if !session.is_authenticated() {
        if class == RouteClass::Public {
            return next.run(request).await;
        }
        // Remember where the user was headed
        let login = format!("{}?from={}", pages::LOGIN, urlencoding::encode(&path));
        return Redirect::temporary(&login).into_response();
    }

    if class == RouteClass::Public {
        return Redirect::temporary(pages::DASHBOARD).into_response();
    }

    // Authenticated on a verify or protected page: the verification status
    // decides where the navigation lands.
    match state.auth.current_user(&session).await {
        Ok((envelope, rotated)) => {
            let user = if envelope.success { envelope.data } else { None };
            let Some(user) = user else {
                // Backend rejected the session outright: drop the cookies
                // and start over at login.
                tracing::warn!(path, error = ?envelope.error, "Session rejected during guard check");
                store.clear();
                return (store.into_jar(), Redirect::temporary(pages::LOGIN)).into_response();
            };

            let redirect = match class {
                RouteClass::Verify if user.email_verified => Some(pages::DASHBOARD),
                RouteClass::Protected if !user.email_verified => Some(pages::VERIFY),
                _ => None,
            };

            let response = match redirect {
                Some(target) => Redirect::temporary(target).into_response(),
                None => next.run(request).await,
            };

            // A refresh happened mid-check: persist the rotated pair
            match rotated {
                Some(pair) => {
                    store.store(&pair);
                    (store.into_jar(), response).into_response()
                }
                None => response,
            }
        }
        Err(AppError::SessionExpired) | Err(AppError::Unauthorized) => {
            store.clear();
            (store.into_jar(), Redirect::temporary(pages::LOGIN)).into_response()
        }
        Err(err) => {
            // Transport trouble checking the profile: let the navigation
            // continue and the page surface the error.
            tracing::error!(error = %err, path, "Profile check failed during guard");
            next.run(request).await
        }
    }
}
