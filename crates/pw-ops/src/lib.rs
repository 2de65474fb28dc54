//! Domain operation façade
//!
//! Named high-level operations over the remote API: reads return typed
//! records, writes fall back to the retry queue when the remote call fails.
//! This is the only surface form-handling code is expected to call.

pub mod hooks;
pub mod records;

pub use records::{EventDetail, EventGroup, EventSummary, Pledge, PledgeDefinition, SaveReceipt};

use std::sync::Arc;

use pw_common::{EndpointConfig, QueueItem};
use pw_queue::{QueueError, QueueStore};
use pw_remote::{ApiClient, RemoteError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub const ACTION_EVENT_SAVE: &str = "event_save";
pub const ACTION_EVENT_DELETE: &str = "event_delete";
pub const ACTION_PLEDGES_SAVE: &str = "pledges_save";

/// What a write operation does when the synchronous call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Persist the call to the retry queue, then surface the failure.
    Enqueue,
    /// Surface the failure without queueing.
    Surface,
}

#[derive(Debug, Clone)]
pub struct OpsConfig {
    pub endpoints: EndpointConfig,
    pub event_save: FailurePolicy,
    pub event_delete: FailurePolicy,
    pub pledges_save: FailurePolicy,
}

impl Default for OpsConfig {
    fn default() -> Self {
        // One consistent policy: every write is queued for replay on failure.
        Self {
            endpoints: EndpointConfig::default(),
            event_save: FailurePolicy::Enqueue,
            event_delete: FailurePolicy::Enqueue,
            pledges_save: FailurePolicy::Enqueue,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// Credentials were missing at startup; the remote surface is inert.
    #[error("Remote API credentials are not configured")]
    Disabled,

    #[error("Remote call for '{action}' failed (queued for replay: {queued})")]
    Failed {
        action: String,
        queued: bool,
        #[source]
        source: RemoteError,
    },

    #[error("Unexpected response shape from '{action}': {reason}")]
    UnexpectedShape { action: String, reason: String },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub type Result<T> = std::result::Result<T, OpsError>;

/// The façade. Built once with credentials (or `None`, which turns every
/// operation into [`OpsError::Disabled`]) and a queue store for write
/// fallback.
pub struct PledgeApi {
    client: Option<ApiClient>,
    store: Arc<dyn QueueStore>,
    config: OpsConfig,
}

impl PledgeApi {
    pub fn new(client: Option<ApiClient>, store: Arc<dyn QueueStore>, config: OpsConfig) -> Self {
        if client.is_none() {
            warn!("Remote API credentials missing, façade operations disabled");
        }
        Self {
            client,
            store,
            config,
        }
    }

    fn client(&self) -> Result<&ApiClient> {
        self.client.as_ref().ok_or(OpsError::Disabled)
    }

    // ------------------------------------------------------------------
    // Reads. Never queued: a failed read has nothing to replay.
    // ------------------------------------------------------------------

    /// All pledge definitions. This listing is intentionally public.
    pub async fn pledge_definitions(&self) -> Result<Vec<PledgeDefinition>> {
        let value = self
            .client()?
            .get_public(&self.config.endpoints.pledge_definitions, &[], &[])
            .await
            .map_err(|e| surface("pledge_definitions", e))?;
        decode("pledge_definitions", value)
    }

    /// Pledges recorded against one event.
    pub async fn pledges(&self, event_id: u64) -> Result<Vec<Pledge>> {
        let value = self
            .client()?
            .get(
                &self.config.endpoints.pledges,
                &[("event", event_id.to_string())],
                &[],
            )
            .await
            .map_err(|e| surface("pledges", e))?;
        decode("pledges", value)
    }

    /// Looks an event group up by name.
    pub async fn event_group(&self, name: &str) -> Result<Option<EventGroup>> {
        let value = self
            .client()?
            .get(
                &self.config.endpoints.event_groups,
                &[("name", name.to_string())],
                &[],
            )
            .await
            .map_err(|e| surface("event_group", e))?;
        let groups: Vec<EventGroup> = decode("event_group", value)?;
        Ok(groups.into_iter().next())
    }

    pub async fn events(&self) -> Result<Vec<EventSummary>> {
        let value = self
            .client()?
            .get(&self.config.endpoints.events, &[], &[])
            .await
            .map_err(|e| surface("events", e))?;
        decode("events", value)
    }

    pub async fn event(&self, id: u64) -> Result<EventDetail> {
        let value = self
            .client()?
            .get(&self.config.endpoints.event_detail(id), &[], &[])
            .await
            .map_err(|e| surface("event", e))?;
        decode("event", value)
    }

    // ------------------------------------------------------------------
    // Writes. Queue fallback per configured policy.
    // ------------------------------------------------------------------

    /// Creates or updates an event; an `id` field in the body means update.
    /// Returns the event id reported by the remote.
    pub async fn event_save(&self, fields: Value) -> Result<u64> {
        let endpoint = self.config.endpoints.events.clone();
        let client = self.client()?;

        match client.post_json(&endpoint, &fields, &[]).await {
            Ok(value) => {
                let receipt: SaveReceipt = decode(ACTION_EVENT_SAVE, value)?;
                debug!(event_id = receipt.data, "Event saved");
                Ok(receipt.data)
            }
            Err(e) => Err(self
                .write_failed(
                    ACTION_EVENT_SAVE,
                    &endpoint,
                    fields,
                    "POST",
                    self.config.event_save,
                    e,
                )
                .await),
        }
    }

    /// Deletes an event by id. Returns the remote's decoded response.
    pub async fn event_delete(&self, id: u64) -> Result<Value> {
        let endpoint = self.config.endpoints.event_detail(id);
        let client = self.client()?;
        let body = Value::Object(Default::default());

        match client.delete(&endpoint, &body, &[]).await {
            Ok(value) => {
                debug!(event_id = id, "Event deleted");
                Ok(value)
            }
            Err(e) => Err(self
                .write_failed(
                    ACTION_EVENT_DELETE,
                    &endpoint,
                    body,
                    "DELETE",
                    self.config.event_delete,
                    e,
                )
                .await),
        }
    }

    /// Submits a batch of pledges for an event. Returns the remote's decoded
    /// response.
    pub async fn pledges_save(&self, submission: Value) -> Result<Value> {
        let endpoint = self.config.endpoints.pledges.clone();
        let client = self.client()?;

        match client.post_json(&endpoint, &submission, &[]).await {
            Ok(value) => Ok(value),
            Err(e) => Err(self
                .write_failed(
                    ACTION_PLEDGES_SAVE,
                    &endpoint,
                    submission,
                    "POST",
                    self.config.pledges_save,
                    e,
                )
                .await),
        }
    }

    async fn write_failed(
        &self,
        action: &str,
        endpoint: &str,
        body: Value,
        method: &str,
        policy: FailurePolicy,
        source: RemoteError,
    ) -> OpsError {
        match policy {
            FailurePolicy::Surface => OpsError::Failed {
                action: action.to_string(),
                queued: false,
                source,
            },
            FailurePolicy::Enqueue => {
                let item = QueueItem::new(action, endpoint, body, method);
                match self.store.add(item).await {
                    Ok(()) => {
                        warn!(action, endpoint, "Write failed, queued for replay");
                        OpsError::Failed {
                            action: action.to_string(),
                            queued: true,
                            source,
                        }
                    }
                    Err(e) => e.into(),
                }
            }
        }
    }
}

fn surface(action: &str, source: RemoteError) -> OpsError {
    OpsError::Failed {
        action: action.to_string(),
        queued: false,
        source,
    }
}

fn decode<T: DeserializeOwned>(action: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| OpsError::UnexpectedShape {
        action: action.to_string(),
        reason: e.to_string(),
    })
}
