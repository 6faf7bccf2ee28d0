//! Offline Worker - offline caching and data sync for the clinic admin app
//!
//! Intercepts the app's requests and answers them from versioned cache
//! partitions or the network, keeps open pages informed about new versions,
//! and handles background sync, push and notification events.

pub mod api;
pub mod cache;
pub mod classify;
pub mod clients;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod manifest;
pub mod messages;
pub mod models;
pub mod notifications;
pub mod strategy;
pub mod tasks;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, WorkerError};
pub use fetch::{Fetcher, HttpFetcher, Request, Response};
pub use worker::{EventOutcome, FetchOutcome, ServiceWorker, WorkerEvent};
