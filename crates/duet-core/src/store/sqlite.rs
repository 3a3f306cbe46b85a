//! Embedded SQLite backend.
//!
//! Uses the runtime-checked `sqlx::query` form so no database is needed at
//! compile time.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::{message_from_row, ListOrder, MessageRow, MessageStore};
use crate::error::StoreError;
use crate::message::{timestamp, Message, MessageContent};
use crate::role::Role;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, \
     sender TEXT NOT NULL, \
     content TEXT NOT NULL, \
     created_at TEXT NOT NULL)";

const INSERT: &str = "INSERT INTO messages (sender, content, created_at) VALUES (?1, ?2, ?3)";
const SELECT_ASC: &str = "SELECT id, sender, content, created_at FROM messages ORDER BY id ASC";
const SELECT_DESC: &str = "SELECT id, sender, content, created_at FROM messages ORDER BY id DESC";

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`, creating missing parent
    /// directories first.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Path {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. The pool is pinned to one connection that
    /// never expires, otherwise the data would vanish with it.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn append(
        &self,
        sender: Role,
        content: &MessageContent,
    ) -> Result<Message, StoreError> {
        let created_at = timestamp(Utc::now());
        let result = sqlx::query(INSERT)
            .bind(sender.code())
            .bind(content.as_str())
            .bind(&created_at)
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();
        debug!(id, sender = %sender, "message appended");
        Ok(Message {
            id,
            sender,
            content: content.as_str().to_owned(),
            created_at,
        })
    }

    async fn list(&self, order: ListOrder) -> Result<Vec<Message>, StoreError> {
        let sql = match order {
            ListOrder::Ascending => SELECT_ASC,
            ListOrder::Descending => SELECT_DESC,
        };
        let rows: Vec<MessageRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(message_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
