//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use duet_core::{AccessConfig, MessageStore};

use crate::config::Config;
use crate::views::Views;

/// State shared across all HTTP handlers and middleware.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Access policy loaded from the access file.
    pub access: Arc<AccessConfig>,
    /// Append-only message store, whichever backend was configured.
    pub store: Arc<dyn MessageStore>,
    pub views: Arc<Views>,
}
