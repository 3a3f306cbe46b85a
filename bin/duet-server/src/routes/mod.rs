//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - shared pages (`/`, `/robots.txt`, `/logout`) and the store health check
//! - the message routes (`/send`, `/log`)
//! - `/login` and `/gallery` under the credential policy, `/select` under the
//!   token policy; the other policy's routes are simply not registered
//! - middleware: noindex header, request tracing, sessions, access gate

mod auth;
mod health;
mod messages;
mod pages;
mod select;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::middleware::{auth as gate, noindex_layer, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(pages::router())
        .merge(auth::logout_router())
        .merge(messages::router());

    app = if state.access.is_token_policy() {
        app.merge(select::router())
    } else {
        app.merge(auth::login_router()).merge(pages::gallery_router())
    };

    // Registered before layering so unknown paths still pass the gate.
    app = app.fallback(pages::not_found);

    // An idle session stops loading once its expiry passes; the cookie
    // carries the same Max-Age.
    let idle = Duration::minutes(state.config.session_idle_minutes.max(1));
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies)
        .with_expiry(Expiry::OnInactivity(idle));

    app
        // Innermost first: the gate needs the session, the session needs
        // nothing, and every response gets the noindex header.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::access_gate,
        ))
        .layer(sessions)
        .layer(middleware::from_fn(trace::trace_middleware))
        .layer(noindex_layer())
        .with_state(state)
}
