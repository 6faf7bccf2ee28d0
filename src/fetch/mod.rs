//! Network seam for the worker.
//!
//! Strategies never talk to the network directly: they go through a
//! [`Fetcher`], always under an explicit deadline ([`fetch_with_deadline`]).
//! [`HttpFetcher`] forwards requests to the upstream origin with reqwest; tests
//! substitute a scripted fetcher.

mod request;
mod response;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

use crate::error::{Result, WorkerError};

pub use request::{Destination, Request};
pub use response::{Response, OFFLINE_HEADER, OFFLINE_MESSAGE};

/// Headers that describe one hop and are not replayed from a stored snapshot.
const HOP_BY_HOP: [&str; 5] = [
    "connection",
    "content-length",
    "keep-alive",
    "transfer-encoding",
    "host",
];

// == Fetcher ==
/// Performs a network fetch for an intercepted request.
///
/// An `Err` means the fetch itself failed (the browser's rejected promise);
/// any HTTP status, including 4xx/5xx, is an `Ok` response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Runs a fetch under a deadline; expiry is reported as `WorkerError::Timeout`.
pub async fn fetch_with_deadline(
    fetcher: &dyn Fetcher,
    request: &Request,
    deadline: Duration,
) -> Result<Response> {
    match tokio::time::timeout(deadline, fetcher.fetch(request)).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Fetch deadline of {:?} expired: {}", deadline, request.url);
            Err(WorkerError::Timeout(deadline.as_millis() as u64))
        }
    }
}

// == HTTP Fetcher ==
/// Fetches from the upstream origin over HTTP.
///
/// The request's path and query are replayed against `upstream`; the page
/// origin is only used for interception decisions.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    upstream: Url,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(upstream: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            upstream,
            timeout,
        })
    }

    fn upstream_url(&self, url: &Url) -> Result<Url> {
        let mut target = self
            .upstream
            .join(url.path())
            .map_err(|e| WorkerError::InvalidUrl(e.to_string()))?;
        target.set_query(url.query());
        Ok(target)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let target = self.upstream_url(&request.url)?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WorkerError::Internal(format!("invalid method: {}", e)))?;

        let mut builder = self.http.request(method, target.clone());
        for (name, value) in &request.headers {
            if HOP_BY_HOP.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let upstream = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                WorkerError::Timeout(self.timeout.as_millis() as u64)
            } else {
                WorkerError::Network(e.to_string())
            }
        })?;

        let status = upstream.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in upstream.headers() {
            if HOP_BY_HOP.contains(&name.as_str()) {
                continue;
            }
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        let body = upstream
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(e.to_string()))?;

        debug!("Upstream {} answered {}", target, status);

        Ok(Response {
            status,
            headers,
            body,
            from_cache: false,
        })
    }
}
