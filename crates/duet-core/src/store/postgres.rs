//! PostgreSQL backend, selected when `DATABASE_URL` is configured.
//!
//! `id` is read back as `BIGINT` so tables created with a plain `SERIAL`
//! column decode the same way as the `BIGSERIAL` this module creates.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use super::{message_from_row, ListOrder, MessageRow, MessageStore};
use crate::error::StoreError;
use crate::message::{timestamp, Message, MessageContent};
use crate::role::Role;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (\
     id BIGSERIAL PRIMARY KEY, \
     sender TEXT NOT NULL, \
     content TEXT NOT NULL, \
     created_at TEXT NOT NULL)";

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
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
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO messages (sender, content, created_at) VALUES ($1, $2, $3) \
             RETURNING id::BIGINT",
        )
        .bind(sender.code())
        .bind(content.as_str())
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await?;
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
            ListOrder::Ascending => {
                "SELECT id::BIGINT, sender, content, created_at FROM messages ORDER BY id ASC"
            }
            ListOrder::Descending => {
                "SELECT id::BIGINT, sender, content, created_at FROM messages ORDER BY id DESC"
            }
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
