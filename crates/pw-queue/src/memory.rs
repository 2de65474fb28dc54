//! In-memory queue store for tests and hosts that manage their own
//! durability.

use async_trait::async_trait;
use pw_common::QueueItem;
use tokio::sync::Mutex;

use crate::store::{apply_head_failure, HeadFailure, QueueStore};
use crate::Result;

#[derive(Default)]
struct Inner {
    queue: Vec<QueueItem>,
    dead: Vec<QueueItem>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn load(&self) -> Result<Vec<QueueItem>> {
        Ok(self.inner.lock().await.queue.clone())
    }

    async fn save(&self, items: &[QueueItem]) -> Result<()> {
        self.inner.lock().await.queue = items.to_vec();
        Ok(())
    }

    async fn add(&self, item: QueueItem) -> Result<()> {
        item.validate()?;
        self.inner.lock().await.queue.push(item);
        Ok(())
    }

    async fn complete_head(&self) -> Result<Option<QueueItem>> {
        let mut inner = self.inner.lock().await;
        if inner.queue.is_empty() {
            return Ok(None);
        }
        Ok(Some(inner.queue.remove(0)))
    }

    async fn fail_head(&self, max_attempts: Option<u32>) -> Result<HeadFailure> {
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;
        Ok(apply_head_failure(
            &mut inner.queue,
            &mut inner.dead,
            max_attempts,
        ))
    }

    async fn dead_letters(&self) -> Result<Vec<QueueItem>> {
        Ok(self.inner.lock().await.dead.clone())
    }
}
