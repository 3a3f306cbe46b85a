//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`]. Bodies are short plain text, matching the
//! HTML forms the board serves.
//!
//! Internal errors (storage, session, rendering) are logged with full detail
//! but only a generic message reaches the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use duet_core::{ContentError, RoleParseError, StoreError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent something the board refuses (bad content, bad role).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Wrong or missing shared token.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("render error: {0}")]
    Render(#[from] minijinja::Error),
}

impl From<ContentError> for ServerError {
    fn from(e: ContentError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<RoleParseError> for ServerError {
    fn from(_: RoleParseError) -> Self {
        ServerError::BadRequest("invalid role; choose H or M".to_owned())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),

            ServerError::Store(e) if e.is_unavailable() => {
                error!(error = %e, "message store unreachable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage unavailable".to_owned(),
                )
            }
            ServerError::Store(e) => {
                error!(error = %e, "message store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Session(e) => {
                error!(error = %e, "session store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Render(e) => {
                error!(error = %e, "view rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, client_message).into_response()
    }
}
