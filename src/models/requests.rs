//! Request DTOs for the gateway control API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /__sw/clients
///
/// # Fields
/// - `url`: The page URL, absolute or relative to the origin
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectClientRequest {
    #[serde(default = "root_path")]
    pub url: String,
}

fn root_path() -> String {
    "/".to_string()
}

impl ConnectClientRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("Client url cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /__sw/sync
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

/// Request body for POST /__sw/notificationclick
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationClickRequest {
    /// Notification id returned by POST /__sw/push
    pub id: u64,
    /// `view`, `dismiss`, or absent for a click on the body
    #[serde(default)]
    pub action: Option<String>,
}
