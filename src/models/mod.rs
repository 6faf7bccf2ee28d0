//! Request and Response models for the gateway control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ConnectClientRequest, NotificationClickRequest, SyncRequest};
pub use responses::{
    ClientMessagesResponse, ConnectClientResponse, DisconnectClientResponse, HealthResponse,
    NotificationClickResponse, NotifiedResponse, WindowInfo,
};
