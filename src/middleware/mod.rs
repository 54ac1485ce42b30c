// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Middleware modules (route guarding, security headers).

pub mod guard;
pub mod security;

pub use guard::route_guard;
