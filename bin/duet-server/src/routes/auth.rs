//! Login and logout.
//!
//! A failed login re-renders the form with an error; there is no lockout and
//! no rate limiting.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use duet_core::access::LOGIN_PATH;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::ServerError;
use crate::session::BoardSession;
use crate::state::AppState;

const LOGIN_FAILED: &str = "Wrong username or password.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Credential policy only.
pub fn login_router() -> Router<Arc<AppState>> {
    Router::new().route(LOGIN_PATH, get(login_page).post(login_submit))
}

pub fn logout_router() -> Router<Arc<AppState>> {
    Router::new().route("/logout", get(logout))
}

async fn login_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    state.views.login(None)
}

async fn login_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    let Some(role) = state.access.authenticate(&form.username, &form.password) else {
        info!(username = %form.username, "login failed");
        return Ok(state.views.login(Some(LOGIN_FAILED))?.into_response());
    };

    session.clear().await;
    BoardSession {
        logged_in: true,
        username: Some(form.username.clone()),
        role: Some(role),
        token: None,
    }
    .save(&session)
    .await?;
    info!(username = %form.username, role = %role, "login succeeded");
    Ok(Redirect::to("/send").into_response())
}

/// Drops the session, then sends the visitor back to where access starts.
async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Redirect, ServerError> {
    session.flush().await?;
    if state.access.is_token_policy() {
        Ok(Redirect::to("/select"))
    } else {
        Ok(Redirect::to(LOGIN_PATH))
    }
}
