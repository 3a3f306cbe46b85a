//! Per-visitor board state kept in the `tower-sessions` session.
//!
//! Everything lives in one serde struct under [`SESSION_KEY`] so a read is a
//! single lookup and a write replaces the whole record.

use duet_core::Role;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::ServerError;

pub const SESSION_KEY: &str = "duet";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSession {
    /// Set by a successful password check (credential policy).
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    /// Shared token remembered after it was first presented (token policy).
    #[serde(default)]
    pub token: Option<String>,
}

impl BoardSession {
    pub async fn load(session: &Session) -> Result<Self, ServerError> {
        Ok(session.get::<Self>(SESSION_KEY).await?.unwrap_or_default())
    }

    pub async fn save(&self, session: &Session) -> Result<(), ServerError> {
        session.insert(SESSION_KEY, self).await?;
        Ok(())
    }

    /// `path` with the remembered token appended as `?token=`, if any.
    pub fn link(&self, path: &str) -> String {
        with_token(path, self.token.as_deref())
    }
}

pub fn with_token(path: &str, token: Option<&str>) -> String {
    match token {
        Some(t) => format!("{path}?token={}", utf8_percent_encode(t, NON_ALPHANUMERIC)),
        None => path.to_owned(),
    }
}
