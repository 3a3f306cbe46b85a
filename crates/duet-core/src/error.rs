use std::path::PathBuf;

use thiserror::Error;

/// Why a submitted message body was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("message is empty")]
    Empty,

    #[error("message must be at most {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role code {0:?}; expected H or M")]
pub struct RoleParseError(pub String);

/// Storage failures, split so callers can tell an unreachable database apart
/// from a statement that failed on a healthy connection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be reached (pool timeout, closed pool, I/O, TLS).
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A statement failed against a reachable database.
    #[error("storage query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// The file-backed database location could not be prepared.
    #[error("cannot prepare database path {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored row held a value the board never writes.
    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Path { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(e),
            other => StoreError::Query(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccessConfigError {
    #[error("cannot read access file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid access file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("credential policy requires at least one user")]
    NoUsers,

    #[error("token policy requires a non-empty token")]
    MissingToken,
}
