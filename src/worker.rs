//! The service worker: one value owning every component, and the event
//! dispatcher that routes each event to the component that handles it.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info};
use url::Url;

use crate::cache::{shared_registry, CacheStats, PartitionNames, SharedRegistry};
use crate::classify::Classifier;
use crate::clients::{ClientHandle, Clients, SharedClients};
use crate::config::Config;
use crate::coordinator::{Coordinator, MessageOutcome};
use crate::error::Result;
use crate::fetch::{Fetcher, Request, Response};
use crate::lifecycle::{ActivationReport, InstallReport, Lifecycle, WorkerState};
use crate::manifest::Manifest;
use crate::messages::CacheStatusReply;
use crate::notifications::{Notification, NotificationCenter, NotificationId, SharedNotifications};
use crate::strategy::Strategies;
use crate::tasks::RefreshTasks;

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The worker produced the response
    Respond(Response),
    /// Not intercepted; the caller should go to the network itself
    Passthrough,
}

/// Everything the platform can deliver to the worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Sync {
        tag: String,
    },
    Push {
        payload: Bytes,
    },
    NotificationClick {
        id: NotificationId,
        action: Option<String>,
    },
    Message {
        data: Bytes,
        reply: Option<oneshot::Sender<CacheStatusReply>>,
    },
    InstallPromptAvailable,
}

#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    /// Clients told to sync
    Synced(usize),
    NotificationShown(Notification),
    /// The window opened by the click, if any
    NotificationClicked(Option<ClientHandle>),
    Message(MessageOutcome),
    /// Clients told about the install prompt
    InstallPromptAnnounced(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
}

/// Snapshot of the worker for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub version: String,
    pub role: String,
    pub partitions: Vec<PartitionSummary>,
    pub stats: CacheStats,
    /// Share of registry lookups that found an entry
    pub hit_rate: f64,
    pub clients: usize,
    pub notifications: usize,
    pub refreshes_in_flight: usize,
    pub install_prompt_pending: bool,
}

#[derive(Clone)]
pub struct ServiceWorker {
    config: Arc<Config>,
    names: PartitionNames,
    classifier: Classifier,
    strategies: Strategies,
    lifecycle: Lifecycle,
    coordinator: Coordinator,
    registry: SharedRegistry,
    clients: SharedClients,
    notifications: SharedNotifications,
    refreshes: RefreshTasks,
    fetcher: Arc<dyn Fetcher>,
}

impl ServiceWorker {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_registry(config, fetcher, shared_registry())
    }

    /// Builds a worker over an existing registry, as a new deploy finds the
    /// partitions its predecessor left behind.
    pub fn with_registry(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        registry: SharedRegistry,
    ) -> Self {
        let names = PartitionNames::from_config(&config);
        let manifest = Manifest::for_role(config.role);
        let clients: SharedClients = Arc::new(RwLock::new(Clients::new()));
        let notifications: SharedNotifications = Arc::new(RwLock::new(NotificationCenter::new()));
        let refreshes = RefreshTasks::new();

        let strategies = Strategies::new(
            registry.clone(),
            fetcher.clone(),
            names.clone(),
            config.origin.clone(),
            config.fetch_timeout(),
            refreshes.clone(),
        );
        let lifecycle = Lifecycle::new(
            registry.clone(),
            clients.clone(),
            fetcher.clone(),
            names.clone(),
            manifest.clone(),
            config.origin.clone(),
            config.fetch_timeout(),
        );
        let coordinator = Coordinator::new(
            &config,
            lifecycle.clone(),
            registry.clone(),
            clients.clone(),
            notifications.clone(),
            manifest.len(),
        );

        Self {
            classifier: Classifier::with_default_patterns(manifest),
            config: Arc::new(config),
            names,
            strategies,
            lifecycle,
            coordinator,
            registry,
            clients,
            notifications,
            refreshes,
            fetcher,
        }
    }

    // == Dispatch ==
    /// Routes one event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => self.lifecycle.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.lifecycle.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.fetch(request).await.map(EventOutcome::Fetched),
            WorkerEvent::Sync { tag } => Ok(EventOutcome::Synced(
                self.coordinator.handle_sync(&tag).await,
            )),
            WorkerEvent::Push { payload } => self
                .coordinator
                .handle_push(&payload)
                .await
                .map(EventOutcome::NotificationShown),
            WorkerEvent::NotificationClick { id, action } => self
                .coordinator
                .handle_notification_click(id, action.as_deref())
                .await
                .map(EventOutcome::NotificationClicked),
            WorkerEvent::Message { data, reply } => self
                .coordinator
                .handle_message(&data, reply)
                .await
                .map(EventOutcome::Message),
            WorkerEvent::InstallPromptAvailable => Ok(EventOutcome::InstallPromptAnnounced(
                self.coordinator.install_prompt_available().await,
            )),
        }
    }

    /// Installs and activates.
    pub async fn start(&self) -> Result<(InstallReport, ActivationReport)> {
        self.lifecycle.start().await
    }

    // == Fetch ==
    /// Intercepts same-origin GETs while active; everything else passes through.
    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome> {
        if !request.is_get() || !request.is_same_origin(&self.config.origin) {
            debug!("Passing through {} {}", request.method, request.url);
            return Ok(FetchOutcome::Passthrough);
        }
        if self.lifecycle.state().await != WorkerState::Activated {
            debug!("Not controlling yet, passing through {}", request.url);
            return Ok(FetchOutcome::Passthrough);
        }

        let category = self.classifier.classify(request.path());
        debug!("{} classified as {:?}", request.url, category);
        self.strategies
            .handle(category, &request)
            .await
            .map(FetchOutcome::Respond)
    }

    /// Stops background refreshes and retires the worker.
    pub async fn shutdown(&self) {
        let aborted = self.refreshes.in_flight().await;
        self.refreshes.abort_all().await;
        self.lifecycle.retire().await;
        info!("Worker shut down, {} refreshes aborted", aborted);
    }

    pub async fn status(&self) -> WorkerStatus {
        let (partitions, stats) = {
            let registry = self.registry.read().await;
            let partitions = registry
                .keys()
                .into_iter()
                .map(|name| PartitionSummary {
                    entries: registry.len(&name),
                    name,
                })
                .collect();
            (partitions, registry.stats())
        };

        WorkerStatus {
            state: self.lifecycle.state().await,
            version: self.names.version.clone(),
            role: self.config.role.to_string(),
            partitions,
            hit_rate: stats.hit_rate(),
            stats,
            clients: self.clients.read().await.len(),
            notifications: self.notifications.read().await.displayed().len(),
            refreshes_in_flight: self.refreshes.in_flight().await,
            install_prompt_pending: self.coordinator.install_prompt_pending(),
        }
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.config.origin
    }

    pub fn names(&self) -> &PartitionNames {
        &self.names
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn clients(&self) -> &SharedClients {
        &self.clients
    }

    pub fn notifications(&self) -> &SharedNotifications {
        &self.notifications
    }

    pub fn refreshes(&self) -> &RefreshTasks {
        &self.refreshes
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }
}
