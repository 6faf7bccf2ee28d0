//! Messages exchanged between the worker and open pages, and push payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::PayloadPolicy;
use crate::error::{Result, WorkerError};

/// Background sync tag that triggers a healthcare data sync.
pub const HEALTHCARE_SYNC_TAG: &str = "healthcare-data-sync";

/// Legacy plain-string message older pages send instead of `SKIP_WAITING`.
const LEGACY_UPDATE_CHECK: &str = "checkForUpdate";

// == Worker → Page ==
/// Broadcast to every open client. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A new version activated and owns the caches
    #[serde(rename = "CACHE_UPDATED")]
    CacheUpdated { version: String },
    /// The page should reconcile its local data
    #[serde(rename = "SYNC_HEALTHCARE_DATA")]
    SyncHealthcareData { action: String },
    /// A deferred install prompt can be shown
    #[serde(rename = "installPromptAvailable")]
    InstallPromptAvailable,
}

// == Page → Worker ==
/// `data` of a `CACHE_HEALTHCARE_DATA` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthcareDataPayload {
    /// Absolute, or relative to the origin
    pub url: String,
    /// Body to store
    pub response: String,
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    SkipWaiting,
    GetCacheStatus,
    /// `None` when `data`, its `url` or its `response` is missing
    CacheHealthcareData(Option<HealthcareDataPayload>),
    /// Unrecognised or missing `type`
    Unknown(String),
}

impl InboundMessage {
    /// Interprets an already-parsed message value.
    pub fn from_value(value: &Value) -> Self {
        if value.as_str() == Some(LEGACY_UPDATE_CHECK) {
            return InboundMessage::SkipWaiting;
        }

        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "SKIP_WAITING" => InboundMessage::SkipWaiting,
            "GET_CACHE_STATUS" => InboundMessage::GetCacheStatus,
            "CACHE_HEALTHCARE_DATA" => {
                InboundMessage::CacheHealthcareData(value.get("data").and_then(healthcare_data))
            }
            other => InboundMessage::Unknown(other.to_string()),
        }
    }

    /// Parses raw message bytes under `policy`.
    pub fn parse(raw: &[u8], policy: PayloadPolicy) -> Result<Self> {
        let value = parse_payload(raw, policy)?;
        Ok(Self::from_value(&value))
    }
}

fn healthcare_data(data: &Value) -> Option<HealthcareDataPayload> {
    let url = data.get("url")?.as_str()?.to_string();
    let response = match data.get("response")? {
        Value::Null => return None,
        Value::String(body) => body.clone(),
        other => other.to_string(),
    };
    if url.is_empty() {
        return None;
    }
    Some(HealthcareDataPayload { url, response })
}

/// Reply to `GET_CACHE_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatusReply {
    /// Number of app-shell assets in the manifest
    #[serde(rename = "cacheSize")]
    pub cache_size: usize,
    pub version: String,
    /// App role
    #[serde(rename = "type")]
    pub kind: String,
}

// == Push ==
/// Push payload; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PushPayload {
    /// Parses a push payload under `policy`. An empty payload is an empty object.
    ///
    /// Under `DefaultToEmpty` each field is read on its own, so a wrongly typed
    /// field falls back to its default without discarding the others.
    pub fn parse(raw: &[u8], policy: PayloadPolicy) -> Result<Self> {
        let value = parse_payload(raw, policy)?;
        match policy {
            PayloadPolicy::DefaultToEmpty => Ok(Self::from_value_lenient(&value)),
            PayloadPolicy::Reject => serde_json::from_value(value)
                .map_err(|e| WorkerError::MalformedPayload(e.to_string())),
        }
    }

    fn from_value_lenient(value: &Value) -> Self {
        let text = |field: &str| match value.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                warn!("Push payload field {} is not a string, using default: {}", field, other);
                None
            }
        };
        Self {
            title: text("title"),
            body: text("body"),
            icon: text("icon"),
            tag: text("tag"),
            urgent: value.get("urgent").map(is_truthy),
            url: text("url"),
        }
    }
}

/// JavaScript truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses raw JSON, applying `policy` when it is malformed.
///
/// An empty (or all-whitespace) payload is always an empty object.
pub fn parse_payload(raw: &[u8], policy: PayloadPolicy) -> Result<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_slice(raw) {
        Ok(value) => Ok(value),
        Err(e) => match policy {
            PayloadPolicy::DefaultToEmpty => {
                warn!("Malformed payload treated as empty object: {}", e);
                Ok(Value::Object(Default::default()))
            }
            PayloadPolicy::Reject => Err(WorkerError::MalformedPayload(e.to_string())),
        },
    }
}
