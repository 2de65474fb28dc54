//! Durable FIFO retry queue for failed remote API writes.
//!
//! Failed write calls are persisted as [`pw_common::QueueItem`]s and replayed
//! in order by the [`ReplayDriver`]: head to tail, stopping at the first
//! failure so that no item is ever skipped ahead of one that failed.

pub mod dispatch;
pub mod memory;
pub mod replay;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use dispatch::{ItemDispatcher, RemoteDispatcher};
pub use memory::MemoryStore;
pub use replay::{ReplayDriver, ReplayListener, ReplayReport};
pub use store::{HeadFailure, QueueStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteQueueStore;

use pw_common::InvalidQueueItem;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error(transparent)]
    Malformed(#[from] InvalidQueueItem),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
