use async_trait::async_trait;
use pw_common::QueueItem;
use pw_remote::{ApiClient, RemoteResult};

/// Re-issues one queue item against the remote API.
#[async_trait]
pub trait ItemDispatcher: Send + Sync {
    async fn dispatch(&self, item: &QueueItem) -> RemoteResult;
}

/// Production dispatcher: replays an item through the generic request path
/// with its recorded endpoint, body and verb.
pub struct RemoteDispatcher {
    client: ApiClient,
}

impl RemoteDispatcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ItemDispatcher for RemoteDispatcher {
    async fn dispatch(&self, item: &QueueItem) -> RemoteResult {
        self.client
            .request(&item.endpoint, &item.body, &item.method, &[])
            .await
    }
}
