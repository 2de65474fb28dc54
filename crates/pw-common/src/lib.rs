use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Queue Item
// ============================================================================

/// A persisted unit of deferred work: one write call to the remote API that
/// failed synchronously and is waiting to be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    /// Domain operation tag, e.g. "event_save" or "pledges_save".
    pub action: String,
    /// Relative API path the call is replayed against.
    pub endpoint: String,
    /// JSON object payload.
    pub body: serde_json::Value,
    /// HTTP verb to replay with.
    pub method: String,
    /// Replay attempts so far.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default = "Utc::now")]
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("Malformed queue item: {reason}")]
pub struct InvalidQueueItem {
    pub reason: String,
}

impl QueueItem {
    pub fn new(
        action: impl Into<String>,
        endpoint: impl Into<String>,
        body: serde_json::Value,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            endpoint: endpoint.into(),
            body,
            method: method.into(),
            attempts: 0,
            queued_at: Utc::now(),
        }
    }

    /// An item cannot be replayed without an endpoint, a verb and an object
    /// body, so such items are refused at enqueue time.
    pub fn validate(&self) -> Result<(), InvalidQueueItem> {
        if self.action.is_empty() {
            return Err(InvalidQueueItem {
                reason: "empty action".to_string(),
            });
        }
        if self.endpoint.is_empty() {
            return Err(InvalidQueueItem {
                reason: "empty endpoint".to_string(),
            });
        }
        if self.method.is_empty() {
            return Err(InvalidQueueItem {
                reason: "empty method".to_string(),
            });
        }
        if !self.body.is_object() {
            return Err(InvalidQueueItem {
                reason: format!("body is not a JSON object for action '{}'", self.action),
            });
        }
        Ok(())
    }

    pub fn increment_attempts(&mut self) {
        self.attempts += 1;
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Remote API connection settings, built once at startup and passed by
/// reference into the client and façade constructors.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub base_url: String,
    pub username: String,
    pub app_password: String,
    /// Disables TLS certificate verification for this target only, for
    /// local/dev installs with self-signed certificates.
    pub insecure_local: bool,
}

impl ApiCredentials {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            app_password: app_password.into(),
            insecure_local: false,
        }
    }

    pub fn insecure_local(mut self, insecure: bool) -> Self {
        self.insecure_local = insecure;
        self
    }

    /// Reads `PW_BASE_URL`, `PW_USERNAME`, `PW_APP_PASSWORD` and the optional
    /// `PW_INSECURE_LOCAL` flag. Returns `None` when any required value is
    /// missing, which disables the remote-call surface entirely.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PW_BASE_URL").ok()?;
        let username = std::env::var("PW_USERNAME").ok()?;
        let app_password = std::env::var("PW_APP_PASSWORD").ok()?;
        let insecure_local = std::env::var("PW_INSECURE_LOCAL")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Some(
            Self::new(base_url, username, app_password).insecure_local(insecure_local),
        )
    }
}

// ============================================================================
// Endpoint Configuration
// ============================================================================

/// Relative paths of the remote API endpoints. Paths are configuration, not
/// contract: hosts targeting a differently-mounted API override the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub pledge_definitions: String,
    pub pledges: String,
    pub event_groups: String,
    pub events: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            pledge_definitions: "api/v1/pledge-definitions".to_string(),
            pledges: "api/v1/pledges".to_string(),
            event_groups: "api/v1/event-groups".to_string(),
            events: "api/v1/events".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn event_detail(&self, id: u64) -> String {
        format!("{}/{}", self.events, id)
    }
}
