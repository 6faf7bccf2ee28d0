//! Response snapshots returned to pages and stored in partitions.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Header marking a response synthesized by the worker while offline.
pub const OFFLINE_HEADER: &str = "x-offline";

/// Message carried by the offline placeholder.
pub const OFFLINE_MESSAGE: &str = "Healthcare data will sync when connection is restored";

// == Response ==
/// A response snapshot: status, headers and the full body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    /// Served from a cache partition rather than the network
    pub from_cache: bool,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
            from_cache: false,
        }
    }

    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Only an exact 200 is written to a partition; other 2xx pass through.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Lossy UTF-8 view of the body.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The placeholder answered for data requests that fail with nothing cached.
    pub fn offline_placeholder() -> Self {
        let body = json!({
            "offline": true,
            "error": "No connection",
            "message": OFFLINE_MESSAGE,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        Self::ok(body.to_string())
            .with_header("content-type", "application/json")
            .with_header(OFFLINE_HEADER, "true")
    }

    pub fn is_offline_placeholder(&self) -> bool {
        self.header(OFFLINE_HEADER) == Some("true")
    }
}
