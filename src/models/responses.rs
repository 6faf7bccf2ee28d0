//! Response DTOs for the gateway control API
//!
//! Defines the structure of outgoing HTTP response bodies. Status snapshots,
//! notifications and message outcomes are serialized from their worker types
//! directly.

use serde::Serialize;

use crate::clients::ClientHandle;
use crate::messages::ClientMessage;

/// Response body for POST /__sw/clients
#[derive(Debug, Clone, Serialize)]
pub struct ConnectClientResponse {
    pub id: u64,
    pub url: String,
}

impl ConnectClientResponse {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// Response body for DELETE /__sw/clients/:id
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectClientResponse {
    pub message: String,
    pub id: u64,
}

impl DisconnectClientResponse {
    pub fn new(id: u64) -> Self {
        Self {
            message: format!("Client {} disconnected", id),
            id,
        }
    }
}

/// Response body for GET /__sw/clients/:id/messages
#[derive(Debug, Clone, Serialize)]
pub struct ClientMessagesResponse {
    pub client: u64,
    /// Messages posted since the last poll, oldest first
    pub messages: Vec<ClientMessage>,
}

/// Response body for broadcasts (sync, install prompt)
#[derive(Debug, Clone, Serialize)]
pub struct NotifiedResponse {
    /// Clients that received the message
    pub notified: usize,
}

/// A window opened by the worker.
#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    pub id: u64,
    pub url: String,
}

impl From<&ClientHandle> for WindowInfo {
    fn from(handle: &ClientHandle) -> Self {
        Self {
            id: handle.id.as_u64(),
            url: handle.url.to_string(),
        }
    }
}

/// Response body for POST /__sw/notificationclick
#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowInfo>,
}

/// Response body for the health endpoint (GET /__sw/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_response_serialize() {
        let resp = ConnectClientResponse::new(4, "http://localhost:3000/");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["url"], "http://localhost:3000/");
    }

    #[test]
    fn test_disconnect_response_serialize() {
        let json = serde_json::to_value(DisconnectClientResponse::new(7)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["message"], "Client 7 disconnected");
    }

    #[test]
    fn test_click_response_without_window() {
        let resp = NotificationClickResponse { window: None };
        assert_eq!(serde_json::to_string(&resp).unwrap(), "{}");
    }

    #[test]
    fn test_messages_response_serialize() {
        let resp = ClientMessagesResponse {
            client: 1,
            messages: vec![ClientMessage::InstallPromptAvailable],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("installPromptAvailable"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
