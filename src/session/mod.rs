// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session persistence for the token pair.
//!
//! One capability, two implementations: the cookie store writes secure
//! http-only cookies onto the response (the normal server-side path), the
//! memory store is a best-effort in-process fallback that cannot set
//! http-only cookies. Which one is used is decided by the calling context,
//! never by environment sniffing inside the store.

use crate::models::tokens::REFRESH_TOKEN_MAX_AGE_SECS;
use crate::models::TokenPair;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Tokens read back from a session store.
///
/// Either side may be absent (expired cookie, partial logout); callers
/// treat the presence of one non-empty token as "authenticated" and leave
/// actual validation to the backend.
#[derive(Debug, Clone, Default)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }
}

impl From<&TokenPair> for SessionTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        }
    }
}

/// Where the current token pair lives for one request.
///
/// `store` replaces the pair as a whole (last write wins); `clear` removes
/// both tokens no matter which of them were present.
pub trait SessionStore {
    fn store(&mut self, pair: &TokenPair);
    fn load(&self) -> SessionTokens;
    fn clear(&mut self);
}

// ─── Cookie store (server-side) ──────────────────────────────

/// Cookie-backed session store wrapping the request's cookie jar.
///
/// The jar accumulates the `Set-Cookie` headers; hand it back to the
/// response with [`CookieSessionStore::into_jar`].
pub struct CookieSessionStore {
    jar: CookieJar,
    secure: bool,
}

impl CookieSessionStore {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    /// Consume the store, yielding the jar for the response.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn auth_cookie(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::seconds(max_age_secs))
            .build()
    }

    fn non_empty(&self, name: &str) -> Option<String> {
        self.jar
            .get(name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl SessionStore for CookieSessionStore {
    fn store(&mut self, pair: &TokenPair) {
        let access = self.auth_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            i64::try_from(pair.expires_in).unwrap_or(i64::MAX),
        );
        let refresh = self.auth_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            REFRESH_TOKEN_MAX_AGE_SECS,
        );

        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(access).add(refresh);
    }

    fn load(&self) -> SessionTokens {
        SessionTokens {
            access_token: self.non_empty(ACCESS_TOKEN_COOKIE),
            refresh_token: self.non_empty(REFRESH_TOKEN_COOKIE),
        }
    }

    fn clear(&mut self) {
        // Empty value with Max-Age=0 and matching attributes removes the
        // cookie in every browser.
        let access = self.auth_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0);
        let refresh = self.auth_cookie(REFRESH_TOKEN_COOKIE, String::new(), 0);

        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(access).add(refresh);
    }
}

// ─── Memory store (best-effort) ──────────────────────────────

/// In-process session store.
///
/// Cannot set http-only cookies, so anything stored here is readable by
/// the process that holds it. A documented limitation, not a bug.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: Option<TokenPair>,
}

impl SessionStore for MemorySessionStore {
    fn store(&mut self, pair: &TokenPair) {
        self.current = Some(pair.clone());
    }

    fn load(&self) -> SessionTokens {
        self.current
            .as_ref()
            .map(SessionTokens::from)
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        self.current = None;
    }
}
