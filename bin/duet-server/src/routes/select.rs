//! Role selection (token policy only).
//!
//! The role arrives in the `user` field: from the query string on GET, from
//! the form body on POST. GET without `user` renders the picker.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use duet_core::Role;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::debug;

use crate::error::ServerError;
use crate::session::BoardSession;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SelectParams {
    #[serde(default)]
    pub user: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/select", get(select_page).post(select_submit))
}

async fn select_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<SelectParams>,
) -> Result<Response, ServerError> {
    let board = BoardSession::load(&session).await?;
    match params.user {
        Some(code) => choose(board, &session, &code).await,
        None => {
            let roles: Vec<&str> = Role::all().map(Role::code).collect();
            Ok(state
                .views
                .select(&board.link("/select"), &roles)?
                .into_response())
        }
    }
}

async fn select_submit(
    session: Session,
    Form(params): Form<SelectParams>,
) -> Result<Response, ServerError> {
    let board = BoardSession::load(&session).await?;
    choose(board, &session, params.user.as_deref().unwrap_or_default()).await
}

/// Validate the code before touching the session, so a bad value leaves any
/// earlier choice intact.
async fn choose(
    mut board: BoardSession,
    session: &Session,
    code: &str,
) -> Result<Response, ServerError> {
    let role: Role = code.parse()?;
    board.role = Some(role);
    board.save(session).await?;
    debug!(role = %role, "role selected");
    Ok(Redirect::to(&board.link("/send")).into_response())
}
