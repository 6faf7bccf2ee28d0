//! Lifecycle Manager
//!
//! Install pre-caches the app-shell manifest and opens the data partition.
//! Activate prunes partitions left behind by older versions, claims every
//! client and tells them a new version owns the caches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{PartitionNames, RequestKey, SharedRegistry};
use crate::clients::SharedClients;
use crate::error::{Result, WorkerError};
use crate::fetch::{fetch_with_deadline, Fetcher, Request, Response};
use crate::manifest::Manifest;
use crate::messages::ClientMessage;

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to activate
    Installed,
    Activating,
    Activated,
    /// Replaced or shut down
    Redundant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Manifest paths stored in the shell partition
    pub cached: Vec<String>,
    /// Manifest paths that could not be fetched or were not 200
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Partitions removed
    pub deleted: Vec<String>,
    /// Clients newly claimed
    pub claimed: usize,
    /// Clients that received `CACHE_UPDATED`
    pub notified: usize,
}

/// Drives install and activation for one worker version.
#[derive(Clone)]
pub struct Lifecycle {
    state: Arc<RwLock<WorkerState>>,
    skip_waiting: Arc<AtomicBool>,
    registry: SharedRegistry,
    clients: SharedClients,
    fetcher: Arc<dyn Fetcher>,
    names: PartitionNames,
    manifest: Manifest,
    origin: Url,
    deadline: Duration,
}

impl Lifecycle {
    pub fn new(
        registry: SharedRegistry,
        clients: SharedClients,
        fetcher: Arc<dyn Fetcher>,
        names: PartitionNames,
        manifest: Manifest,
        origin: Url,
        deadline: Duration,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(WorkerState::Parsed)),
            skip_waiting: Arc::new(AtomicBool::new(false)),
            registry,
            clients,
            fetcher,
            names,
            manifest,
            origin,
            deadline,
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether skip-waiting has been requested.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(WorkerError::State(format!(
                "cannot move to {:?} from {:?}",
                to, *state
            )));
        }
        debug!("Worker state {:?} -> {:?}", *state, to);
        *state = to;
        Ok(())
    }

    // == Install ==
    /// Pre-caches the manifest. Individual asset failures are logged and
    /// reported, never fatal.
    pub async fn install(&self) -> Result<InstallReport> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;
        self.skip_waiting.store(true, Ordering::SeqCst);
        info!("Installing version {}", self.names.version);

        self.registry.write().await.open(&self.names.shell);

        let mut fetches = JoinSet::new();
        for (index, path) in self.manifest.paths().iter().enumerate() {
            let url = match self.origin.join(path) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping manifest path {}: {}", path, e);
                    continue;
                }
            };
            let fetcher = self.fetcher.clone();
            let deadline = self.deadline;
            fetches.spawn(async move {
                let request = Request::get(url);
                let outcome = fetch_with_deadline(fetcher.as_ref(), &request, deadline).await;
                (index, request, outcome)
            });
        }

        let mut outcomes: Vec<(usize, Request, Result<Response>)> = Vec::new();
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Pre-cache task failed: {}", e),
            }
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut report = InstallReport::default();
        let mut attempted = vec![false; self.manifest.len()];
        {
            let mut registry = self.registry.write().await;
            for (index, request, outcome) in outcomes {
                attempted[index] = true;
                let path = self.manifest.paths()[index].clone();
                match outcome {
                    Ok(response) if response.is_cacheable() => {
                        registry.put(&self.names.shell, RequestKey::from(&request), &response);
                        report.cached.push(path);
                    }
                    Ok(response) => {
                        warn!("Failed to cache {}: status {}", path, response.status);
                        report.failed.push(path);
                    }
                    Err(e) => {
                        warn!("Failed to cache {}: {}", path, e);
                        report.failed.push(path);
                    }
                }
            }
            registry.open(&self.names.data);
        }
        for (index, path) in self.manifest.paths().iter().enumerate() {
            if !attempted[index] && !report.failed.contains(path) {
                report.failed.push(path.clone());
            }
        }

        self.transition(WorkerState::Installing, WorkerState::Installed).await?;
        info!(
            "Install complete: {} cached, {} failed",
            report.cached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    // == Activate ==
    /// Prunes old partitions, claims clients and broadcasts `CACHE_UPDATED`.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;
        info!("Activating version {}", self.names.version);

        let deleted = self
            .registry
            .write()
            .await
            .delete_all_except(&self.names.prefixes(), &self.names.current());

        let (claimed, notified) = {
            let mut clients = self.clients.write().await;
            let claimed = clients.claim();
            let notified = clients.broadcast(&ClientMessage::CacheUpdated {
                version: self.names.version.clone(),
            });
            (claimed, notified)
        };

        self.transition(WorkerState::Activating, WorkerState::Activated).await?;
        Ok(ActivationReport {
            deleted,
            claimed,
            notified,
        })
    }

    /// Requests skip-waiting; activates at once when installed and waiting.
    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.state().await == WorkerState::Installed {
            return self.activate().await.map(Some);
        }
        debug!("Skip waiting requested while {:?}", self.state().await);
        Ok(None)
    }

    /// Installs, then activates straight away since skip-waiting is forced.
    pub async fn start(&self) -> Result<(InstallReport, ActivationReport)> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Marks the worker as retired. Later fetches are passed through.
    pub async fn retire(&self) {
        let mut state = self.state.write().await;
        info!("Worker {} is now redundant", self.names.version);
        *state = WorkerState::Redundant;
    }
}
