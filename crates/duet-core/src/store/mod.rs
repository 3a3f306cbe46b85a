//! Message storage.
//!
//! [`MessageStore`] is the only way handlers touch the database. Two
//! implementations exist: [`sqlite::SqliteStore`] (embedded, file-backed) and
//! [`postgres::PostgresStore`] (client/server). [`connect`] picks one from
//! [`StoreSettings`] and creates the schema before returning.
//!
//! Every statement runs on a pooled connection that goes back to the pool
//! when the statement future completes or is dropped. Each statement commits
//! on its own; there are no multi-statement transactions.

pub mod postgres;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use strum::{Display, EnumString};
use tracing::info;

use crate::error::StoreError;
use crate::message::{Message, MessageContent};
use crate::role::Role;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Direction of the log view. Ascending (oldest first) unless configured
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ListOrder {
    #[default]
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}

#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Short backend name for logs (`"sqlite"`, `"postgres"`).
    fn backend(&self) -> &'static str;

    /// Create the `messages` table if it does not exist yet.
    async fn init_schema(&self) -> Result<(), StoreError>;

    /// Insert one message, stamping it with the current UTC time.
    async fn append(
        &self,
        sender: Role,
        content: &MessageContent,
    ) -> Result<Message, StoreError>;

    /// Every stored message, ordered by id.
    async fn list(&self, order: ListOrder) -> Result<Vec<Message>, StoreError>;

    /// Run a trivial statement to confirm the database answers.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Close the pool. Later calls fail as unavailable.
    async fn close(&self);
}

/// Where messages live.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Client/server database URL. When set, PostgreSQL is used.
    pub database_url: Option<String>,
    /// File used by the embedded backend when no URL is configured.
    pub sqlite_path: PathBuf,
    pub max_connections: u32,
}

/// Open the configured backend and make sure the schema exists.
pub async fn connect(settings: &StoreSettings) -> Result<Arc<dyn MessageStore>, StoreError> {
    let max = settings.max_connections;
    let url = settings.database_url.as_deref().filter(|u| !u.is_empty());
    let store: Arc<dyn MessageStore> = match url {
        Some(url) => Arc::new(PostgresStore::connect(url, max).await?),
        None => Arc::new(SqliteStore::open(&settings.sqlite_path, max).await?),
    };
    store.init_schema().await?;
    info!(backend = store.backend(), "message store ready");
    Ok(store)
}

/// `(id, sender, content, created_at)` as selected by both backends.
pub(crate) type MessageRow = (i64, String, String, String);

pub(crate) fn message_from_row(
    (id, sender, content, created_at): MessageRow,
) -> Result<Message, StoreError> {
    let sender = sender.parse::<Role>().map_err(|e| StoreError::Corrupt {
        id,
        reason: e.to_string(),
    })?;
    Ok(Message {
        id,
        sender,
        content,
        created_at,
    })
}
