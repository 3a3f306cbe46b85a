//! Composition form, message submission and the log view.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use duet_core::access::LOGIN_PATH;
use duet_core::{MessageContent, Role, MAX_CONTENT_CHARS};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::ServerError;
use crate::session::BoardSession;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub content: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send", get(send_page).post(send_submit))
        .route("/log", get(log_page))
}

/// The sender role for this visitor, or the redirect that gets them one.
fn role_or_redirect(state: &AppState, board: &BoardSession) -> Result<Role, Response> {
    match board.role {
        Some(role) => Ok(role),
        None if state.access.is_token_policy() => {
            Err(Redirect::to(&board.link("/select")).into_response())
        }
        None => Err(Redirect::to(LOGIN_PATH).into_response()),
    }
}

async fn send_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ServerError> {
    let board = BoardSession::load(&session).await?;
    let role = match role_or_redirect(&state, &board) {
        Ok(role) => role,
        Err(redirect) => return Ok(redirect),
    };
    let page = state.views.send(
        &board.link("/send"),
        &board.link("/log"),
        board.username.as_deref(),
        role.code(),
        MAX_CONTENT_CHARS,
    )?;
    Ok(page.into_response())
}

async fn send_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<SendForm>,
) -> Result<Response, ServerError> {
    let board = BoardSession::load(&session).await?;
    let role = match role_or_redirect(&state, &board) {
        Ok(role) => role,
        Err(redirect) => return Ok(redirect),
    };
    let content = MessageContent::parse(&form.content)?;
    let message = state.store.append(role, &content).await?;
    info!(id = message.id, sender = %message.sender, "message stored");
    Ok(Redirect::to(&board.link("/log")).into_response())
}

async fn log_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ServerError> {
    let board = BoardSession::load(&session).await?;
    if let Err(redirect) = role_or_redirect(&state, &board) {
        return Ok(redirect);
    }
    let rows = state.store.list(state.config.log_order).await?;
    Ok(state.views.log(&rows, &board.link("/send"))?.into_response())
}
