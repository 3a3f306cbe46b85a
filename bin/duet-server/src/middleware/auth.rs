//! Access gate: runs before routing on every request.
//!
//! The decision itself is [`duet_core::AccessConfig::evaluate`]; this layer
//! feeds it the path, the `token` query parameter and the session, then acts
//! on the verdict.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use duet_core::access::LOGIN_PATH;
use duet_core::{GateInput, Verdict};
use tower_sessions::Session;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::session::BoardSession;
use crate::state::AppState;

const TOKEN_PARAM: &str = "token";

pub async fn access_gate(
    State(state): State<Arc<AppState>>,
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    match gate(&state, &session, req.uri()).await {
        Ok(None) => next.run(req).await,
        Ok(Some(denied)) => denied,
        Err(e) => e.into_response(),
    }
}

/// `None` to continue to the router, `Some` to answer right away.
async fn gate(
    state: &AppState,
    session: &Session,
    uri: &Uri,
) -> Result<Option<Response>, ServerError> {
    let board = BoardSession::load(session).await?;
    let presented = presented_tokens(uri);
    let presented: Vec<&str> = presented.iter().map(String::as_str).collect();

    let verdict = state.access.evaluate(GateInput {
        path: uri.path(),
        query_tokens: &presented,
        logged_in: board.logged_in,
        session_token: board.token.as_deref(),
    });

    match verdict {
        Verdict::Admit => Ok(None),
        Verdict::AdmitRemember(token) => {
            debug!("shared token accepted; remembering in session");
            BoardSession {
                token: Some(token),
                ..board
            }
            .save(session)
            .await?;
            Ok(None)
        }
        Verdict::RedirectToLogin => {
            debug!(path = uri.path(), "not logged in; redirecting");
            Ok(Some(Redirect::to(LOGIN_PATH).into_response()))
        }
        Verdict::Forbidden => {
            info!(path = uri.path(), "request without a valid token refused");
            session.flush().await?;
            Err(ServerError::Forbidden(
                "access denied: a valid access token is required".to_owned(),
            ))
        }
    }
}

/// Every `token` value in the query string, repetitions included.
fn presented_tokens(uri: &Uri) -> Vec<String> {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs
            .into_iter()
            .filter(|(key, _)| key == TOKEN_PARAM)
            .map(|(_, value)| value)
            .collect(),
        // An unreadable query that mentions the parameter still counts as a
        // presented token, and an empty one never matches.
        Err(_) if uri.query().is_some_and(|q| q.contains(TOKEN_PARAM)) => vec![String::new()],
        Err(_) => Vec::new(),
    }
}
