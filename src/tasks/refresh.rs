//! Background Refresh Tasks
//!
//! Stale-while-revalidate refreshes run after the cached response has already
//! been returned. They are tracked so the gateway can abort them on shutdown
//! and tests can wait for them to land.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::cache::{RequestKey, SharedRegistry};
use crate::fetch::{fetch_with_deadline, Fetcher, Request};

/// Tracks in-flight background refreshes.
#[derive(Clone, Default)]
pub struct RefreshTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl RefreshTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a refresh of `request` into `partition`.
    ///
    /// A 200 overwrites the entry; any other status or a failed fetch leaves
    /// the cached entry untouched and is only logged.
    pub async fn spawn_refresh(
        &self,
        registry: SharedRegistry,
        fetcher: Arc<dyn Fetcher>,
        partition: String,
        request: Request,
        deadline: Duration,
    ) {
        let mut set = self.set.lock().await;
        // Reap finished refreshes so the set does not grow without bound
        while set.try_join_next().is_some() {}

        set.spawn(async move {
            match fetch_with_deadline(fetcher.as_ref(), &request, deadline).await {
                Ok(response) if response.is_cacheable() => {
                    registry
                        .write()
                        .await
                        .put(&partition, RequestKey::from(&request), &response);
                    info!("Updated healthcare cache: {}", request.url);
                }
                Ok(response) => {
                    debug!(
                        "Background refresh of {} returned {}, keeping cached copy",
                        request.url, response.status
                    );
                }
                Err(e) => {
                    debug!("Background refresh of {} failed: {}", request.url, e);
                }
            }
        });
    }

    /// Waits for every refresh spawned so far. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let mut pending = std::mem::take(&mut *self.set.lock().await);
        let mut completed = 0;
        while pending.join_next().await.is_some() {
            completed += 1;
        }
        completed
    }

    /// Aborts every in-flight refresh.
    pub async fn abort_all(&self) {
        self.set.lock().await.abort_all();
    }

    pub async fn in_flight(&self) -> usize {
        self.set.lock().await.len()
    }
}
