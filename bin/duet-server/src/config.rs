//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;

use duet_core::store::{ListOrder, StoreSettings};

/// Runtime configuration for duet-server.
///
/// Every field has a default so the server starts without any environment
/// variables set, apart from the access file which must exist.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port (default: `5000`). The bind host is always `0.0.0.0`.
    pub port: u16,

    /// PostgreSQL URL. When unset the embedded SQLite file is used.
    pub database_url: Option<String>,

    /// SQLite database file (default: `"instance/space.db"`).
    pub sqlite_path: PathBuf,

    /// Upper bound on pooled database connections.
    pub db_max_connections: u32,

    /// TOML file holding the access policy (default: `"access.toml"`).
    pub access_file: PathBuf,

    /// Direction of the log view (default: ascending).
    pub log_order: ListOrder,

    /// Mark the session cookie `Secure` (only sent over HTTPS).
    pub secure_cookies: bool,

    /// Sessions idle longer than this are dropped (default: `720`).
    pub session_idle_minutes: i64,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_sessions=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            port: parse_env("PORT", 5000),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            sqlite_path: PathBuf::from(env_or("DUET_SQLITE_PATH", "instance/space.db")),
            db_max_connections: parse_env("DUET_DB_MAX_CONNECTIONS", 5),
            access_file: PathBuf::from(env_or("DUET_ACCESS_FILE", "access.toml")),
            log_order: parse_env("DUET_LOG_ORDER", ListOrder::Ascending),
            secure_cookies: env_flag("DUET_SECURE_COOKIES"),
            session_idle_minutes: parse_env("DUET_SESSION_IDLE_MINUTES", 720),
            log_level: env_or("DUET_LOG", "info"),
            log_json: env_flag("DUET_LOG_JSON"),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            database_url: self.database_url.clone(),
            sqlite_path: self.sqlite_path.clone(),
            max_connections: self.db_max_connections,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
