//! Typed response records, one per endpoint.
//!
//! The remote API returns JSON; each operation decodes the shape it actually
//! needs and tolerates extra fields. Only the generic replay path stays
//! untyped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pledge the platform offers, e.g. "Go vegan".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeDefinition {
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Estimated annual saving in kg CO2e, where the platform provides one.
    #[serde(default)]
    pub kg_co2e: Option<f64>,
}

/// A pledge made by an attendee against a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: u64,
    /// Id of the pledge definition this was made against.
    pub pledge: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGroup {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub starts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub starts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends: Option<DateTime<Utc>>,
}

/// Response to an event save: the `data` field carries the event id, for
/// creates and updates alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub data: u64,
}
