//! SQLite-backed queue store.
//!
//! The queue is one named record: a single row keyed by `record_key` holding
//! the full item sequence as a JSON array. Dead letters live in a sibling row
//! under a derived key. Every mutation is a whole-record read-modify-write,
//! serialized by an internal lock.

use async_trait::async_trait;
use chrono::Utc;
use pw_common::QueueItem;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::store::{apply_head_failure, HeadFailure, QueueStore};
use crate::Result;

/// Record key used when the host does not supply one.
pub const DEFAULT_RECORD_KEY: &str = "pledgewire_retry_queue";

pub struct SqliteQueueStore {
    pool: SqlitePool,
    record_key: String,
    write_lock: Mutex<()>,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool, record_key: impl Into<String>) -> Self {
        Self {
            pool,
            record_key: record_key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS retry_queue (
                record_key TEXT PRIMARY KEY,
                items TEXT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn dead_letter_key(&self) -> String {
        format!("{}.dead_letter", self.record_key)
    }

    async fn read_record(&self, key: &str) -> Result<Vec<QueueItem>> {
        let row = sqlx::query("SELECT items FROM retry_queue WHERE record_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("items");
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn write_record(&self, key: &str, items: &[QueueItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        sqlx::query(
            r#"
            INSERT INTO retry_queue (record_key, items, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(record_key)
            DO UPDATE SET items = excluded.items, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn load(&self) -> Result<Vec<QueueItem>> {
        self.read_record(&self.record_key).await
    }

    async fn save(&self, items: &[QueueItem]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_record(&self.record_key, items).await
    }

    async fn add(&self, item: QueueItem) -> Result<()> {
        item.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut queue = self.read_record(&self.record_key).await?;
        queue.push(item);
        self.write_record(&self.record_key, &queue).await
    }

    async fn complete_head(&self) -> Result<Option<QueueItem>> {
        let _guard = self.write_lock.lock().await;
        let mut queue = self.read_record(&self.record_key).await?;
        if queue.is_empty() {
            return Ok(None);
        }
        let head = queue.remove(0);
        self.write_record(&self.record_key, &queue).await?;
        Ok(Some(head))
    }

    async fn fail_head(&self, max_attempts: Option<u32>) -> Result<HeadFailure> {
        let _guard = self.write_lock.lock().await;
        let mut queue = self.read_record(&self.record_key).await?;
        let mut dead = self.read_record(&self.dead_letter_key()).await?;

        let outcome = apply_head_failure(&mut queue, &mut dead, max_attempts);

        match &outcome {
            HeadFailure::Empty => {}
            HeadFailure::Retained => {
                self.write_record(&self.record_key, &queue).await?;
            }
            HeadFailure::DeadLettered(_) => {
                self.write_record(&self.record_key, &queue).await?;
                self.write_record(&self.dead_letter_key(), &dead).await?;
            }
        }

        Ok(outcome)
    }

    async fn dead_letters(&self) -> Result<Vec<QueueItem>> {
        self.read_record(&self.dead_letter_key()).await
    }
}
