use async_trait::async_trait;
use pw_common::QueueItem;

use crate::Result;

/// Outcome of recording a failed replay attempt on the queue head.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadFailure {
    /// The head stays in place and blocks the queue until the next run.
    Retained,
    /// The head exceeded the attempt bound and was moved to the dead-letter
    /// record; the next item is eligible this run.
    DeadLettered(QueueItem),
    /// The queue was empty.
    Empty,
}

/// Durable FIFO persistence for queue items.
///
/// The whole queue is one named record, read and written as a whole. Backends
/// serialize their read-modify-write sequences internally, so a producer
/// calling [`add`](QueueStore::add) never loses an item to a concurrently
/// committing replay run. The head operations assume a single consumer: only
/// one replay run mutates the head at a time.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Returns the persisted queue, head first. An absent record reads as an
    /// empty queue.
    async fn load(&self) -> Result<Vec<QueueItem>>;

    /// Overwrites the persisted record with exactly the given sequence.
    async fn save(&self, items: &[QueueItem]) -> Result<()>;

    /// Validates the item and appends it at the tail.
    async fn add(&self, item: QueueItem) -> Result<()>;

    /// Removes and returns the head after a successful replay. Empty queues
    /// are left untouched.
    async fn complete_head(&self) -> Result<Option<QueueItem>>;

    /// Increments the head's attempt count after a failed replay. With a
    /// configured bound, a head that reaches it moves to the dead-letter
    /// record instead of blocking the queue forever.
    async fn fail_head(&self, max_attempts: Option<u32>) -> Result<HeadFailure>;

    /// Items parked after exceeding the attempt bound.
    async fn dead_letters(&self) -> Result<Vec<QueueItem>>;
}

/// Applies the attempt bound to a failed head item within a loaded queue.
/// Shared by backends so the retention policy cannot drift between them.
pub(crate) fn apply_head_failure(
    queue: &mut Vec<QueueItem>,
    dead: &mut Vec<QueueItem>,
    max_attempts: Option<u32>,
) -> HeadFailure {
    let Some(head) = queue.first_mut() else {
        return HeadFailure::Empty;
    };

    head.increment_attempts();

    match max_attempts {
        Some(max) if head.attempts >= max => {
            let item = queue.remove(0);
            dead.push(item.clone());
            HeadFailure::DeadLettered(item)
        }
        _ => HeadFailure::Retained,
    }
}
