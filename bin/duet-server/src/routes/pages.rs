//! Landing redirect, robots file and the gallery page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use tower_sessions::Session;

use crate::error::ServerError;
use crate::session::BoardSession;
use crate::state::AppState;

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/robots.txt", get(robots))
}

/// Credential policy only.
pub fn gallery_router() -> Router<Arc<AppState>> {
    Router::new().route("/gallery", get(gallery))
}

/// `/` goes to the composition view, or to role selection under the token
/// policy.
async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Redirect, ServerError> {
    if state.access.is_token_policy() {
        let board = BoardSession::load(&session).await?;
        Ok(Redirect::to(&board.link("/select")))
    } else {
        Ok(Redirect::to("/send"))
    }
}

async fn robots() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT,
    )
}

async fn gallery(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    state.views.gallery()
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}
