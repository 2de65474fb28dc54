//! Remote API client
//!
//! Performs one authenticated HTTP exchange against the remote content API
//! and normalizes the outcome: either a decoded JSON value or a definite
//! failure. No panic crosses this boundary; callers always have exactly one
//! error arm to handle.

use std::time::Duration;

use pw_common::ApiCredentials;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Write endpoints report creation with 201 and update with 200.
const READ_CODES: &[u16] = &[200];
const WRITE_CODES: &[u16] = &[200, 201];

/// Client timeouts. The transport defaults are deliberately not relied on.
#[derive(Debug, Clone)]
pub struct RemoteClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RemoteClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection, DNS, TLS or timeout failure before any status was obtained.
    #[error("Transport error for {method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside the accepted set.
    #[error("Unexpected status {status} for {method} {url}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Failed to decode response from {method} {url}: {reason}")]
    Decode {
        method: String,
        url: String,
        reason: String,
    },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

/// The outcome of one HTTP exchange.
pub type RemoteResult = Result<Value, RemoteError>;

enum Payload<'a> {
    None,
    Json(&'a Value),
    Form(&'a Value),
}

/// One authenticated connection to the remote API. Cheap to clone; a fresh
/// instance per call is also fine.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    credentials: ApiCredentials,
}

impl ApiClient {
    pub fn new(credentials: &ApiCredentials, config: RemoteClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        // Scoped to this client instance only: unrelated clients in the same
        // process keep full certificate verification.
        if credentials.insecure_local {
            warn!(
                base_url = %credentials.base_url,
                "TLS certificate verification disabled for local target"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            credentials: credentials.clone(),
        })
    }

    /// Sends an authenticated GET request. Read endpoints accept 200 only.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        self.send(
            Method::GET,
            endpoint,
            params,
            Payload::None,
            true,
            extra_headers,
            READ_CODES,
        )
        .await
    }

    /// Sends a GET request without an Authorization header. Some read
    /// endpoints are intentionally public.
    pub async fn get_public(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        self.send(
            Method::GET,
            endpoint,
            params,
            Payload::None,
            false,
            extra_headers,
            READ_CODES,
        )
        .await
    }

    /// Sends an authenticated POST with a JSON-encoded body.
    pub async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        self.send(
            Method::POST,
            endpoint,
            &[],
            Payload::Json(body),
            true,
            extra_headers,
            WRITE_CODES,
        )
        .await
    }

    /// Sends an authenticated POST with a form-encoded body.
    pub async fn post_form(
        &self,
        endpoint: &str,
        body: &Value,
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        self.send(
            Method::POST,
            endpoint,
            &[],
            Payload::Form(body),
            true,
            extra_headers,
            WRITE_CODES,
        )
        .await
    }

    /// Sends an authenticated DELETE request.
    pub async fn delete(
        &self,
        endpoint: &str,
        body: &Value,
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        self.send(
            Method::DELETE,
            endpoint,
            &[],
            Payload::Form(body),
            true,
            extra_headers,
            READ_CODES,
        )
        .await
    }

    /// Generic verb dispatch used by queue replay. The body is JSON-encoded
    /// for POST and form-encoded otherwise; both 200 and 201 are accepted so
    /// any replayed write is covered.
    pub async fn request(
        &self,
        endpoint: &str,
        body: &Value,
        method: &str,
        extra_headers: &[(&str, &str)],
    ) -> RemoteResult {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            RemoteError::InvalidRequest {
                reason: format!("unsupported HTTP method '{method}'"),
            }
        })?;

        let payload = if method == Method::POST {
            Payload::Json(body)
        } else {
            Payload::Form(body)
        };

        self.send(method, endpoint, &[], payload, true, extra_headers, WRITE_CODES)
            .await
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        payload: Payload<'_>,
        auth: bool,
        extra_headers: &[(&str, &str)],
        accepted: &[u16],
    ) -> RemoteResult {
        let url = self.join_url(endpoint);
        let method_str = method.to_string();

        let mut req = self.http.request(method, &url);

        if auth {
            req = req.basic_auth(&self.credentials.username, Some(&self.credentials.app_password));
        }
        if !params.is_empty() {
            req = req.query(params);
        }
        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }

        req = match payload {
            Payload::None => req,
            Payload::Json(body) => req.json(body),
            Payload::Form(body) => req.form(&form_fields(body)),
        };

        debug!(method = %method_str, url = %url, "Sending remote API request");

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(method = %method_str, url = %url, error = %e, "Remote request failed");
                return Err(RemoteError::Transport {
                    method: method_str,
                    url,
                    source: e,
                });
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(method = %method_str, url = %url, error = %e, "Failed to read response body");
                return Err(RemoteError::Transport {
                    method: method_str,
                    url,
                    source: e,
                });
            }
        };

        if !accepted.contains(&status) {
            warn!(
                method = %method_str,
                url = %url,
                status,
                body = %truncate(&text, 512),
                "Remote request was not successful"
            );
            return Err(RemoteError::UnexpectedStatus {
                method: method_str,
                url,
                status,
                body: text,
            });
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(
                    method = %method_str,
                    url = %url,
                    error = %e,
                    body = %truncate(&text, 512),
                    "Failed to decode JSON response"
                );
                Err(RemoteError::Decode {
                    method: method_str,
                    url,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn join_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.credentials.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Flattens a JSON object into form fields. Scalars are rendered plainly,
/// nested values fall back to their JSON encoding.
fn form_fields(body: &Value) -> Vec<(String, String)> {
    let Some(map) = body.as_object() else {
        return Vec::new();
    };

    map.iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
