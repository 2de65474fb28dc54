//! Replay notification hooks.
//!
//! The replay driver broadcasts each successfully replayed item to listeners
//! registered for its action. These hooks currently only log the completion;
//! they are the seam where hosts react to deferred writes landing (sending a
//! confirmation, refreshing a cache) once they need to.

use std::sync::Arc;

use async_trait::async_trait;
use pw_common::QueueItem;
use pw_queue::ReplayListener;
use serde_json::Value;
use tracing::info;

use crate::{ACTION_EVENT_DELETE, ACTION_EVENT_SAVE, ACTION_PLEDGES_SAVE};

struct WriteReplayedHook {
    action: &'static str,
}

#[async_trait]
impl ReplayListener for WriteReplayedHook {
    fn action(&self) -> &str {
        self.action
    }

    async fn on_replayed(&self, item: &QueueItem, _result: &Value) {
        info!(
            action = self.action,
            id = %item.id,
            endpoint = %item.endpoint,
            attempts = item.attempts,
            "Queued write replayed successfully"
        );
    }
}

/// One listener per write action, for registration on the replay driver.
pub fn replay_listeners() -> Vec<Arc<dyn ReplayListener>> {
    [ACTION_EVENT_SAVE, ACTION_EVENT_DELETE, ACTION_PLEDGES_SAVE]
        .into_iter()
        .map(|action| Arc::new(WriteReplayedHook { action }) as Arc<dyn ReplayListener>)
        .collect()
}
