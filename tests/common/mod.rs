//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use serde_json::Value;
use url::Url;

use offline_worker::config::Config;
use offline_worker::{Fetcher, Request, Response, Result, ServiceWorker, WorkerError};

pub const ORIGIN: &str = "http://localhost:3000";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// A fake upstream: responses keyed by path, everything else unreachable.
#[derive(Default)]
pub struct FakeNetwork {
    pages: Mutex<HashMap<String, Response>>,
    online: Mutex<bool>,
    latency: Mutex<Duration>,
    requests: AtomicUsize,
}

impl FakeNetwork {
    pub fn online() -> Arc<Self> {
        let network = Self::default();
        *network.online.lock().unwrap() = true;
        Arc::new(network)
    }

    pub fn serve(&self, path: &str, body: &str) {
        self.serve_response(path, Response::ok(body.to_string()));
    }

    pub fn serve_response(&self, path: &str, response: Response) {
        self.pages.lock().unwrap().insert(path.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        *self.online.lock().unwrap() = online;
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if !*self.online.lock().unwrap() {
            return Err(WorkerError::Network("network down".to_string()));
        }
        let page = self.pages.lock().unwrap().get(request.path()).cloned();
        Ok(page.unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub fn config(version: &str) -> Config {
    Config {
        version: version.to_string(),
        fetch_timeout_ms: 2_000,
        ..Config::default()
    }
}

/// A worker for `version` that has installed and activated.
pub async fn active_worker(network: Arc<FakeNetwork>, version: &str) -> ServiceWorker {
    let worker = ServiceWorker::new(config(version), network);
    worker.start().await.unwrap();
    worker
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
