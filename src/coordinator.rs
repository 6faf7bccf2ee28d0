//! Sync & Push Coordinator
//!
//! Reacts to background sync, push, notification click and page message
//! events, and to the deferred install prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{PartitionNames, RequestKey, SharedRegistry};
use crate::clients::{ClientHandle, SharedClients};
use crate::config::{Config, PayloadPolicy, Role};
use crate::error::{Result, WorkerError};
use crate::fetch::Response;
use crate::lifecycle::{ActivationReport, Lifecycle};
use crate::messages::{
    CacheStatusReply, ClientMessage, HealthcareDataPayload, InboundMessage, PushPayload,
    HEALTHCARE_SYNC_TAG,
};
use crate::notifications::{
    Notification, NotificationDefaults, NotificationId, SharedNotifications, ACTION_VIEW,
};

/// What a page message led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "handled", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Skip-waiting recorded; carries the activation if it happened now
    SkipWaiting { activation: Option<ActivationReport> },
    /// Status reply produced (and sent, if a reply port was given)
    Status { status: CacheStatusReply },
    /// Body stored in the data partition
    DataCached { key: String },
    Ignored,
}

#[derive(Clone)]
pub struct Coordinator {
    lifecycle: Lifecycle,
    registry: SharedRegistry,
    clients: SharedClients,
    notifications: SharedNotifications,
    names: PartitionNames,
    defaults: NotificationDefaults,
    origin: Url,
    role: Role,
    policy: PayloadPolicy,
    manifest_len: usize,
    install_prompt: Arc<AtomicBool>,
}

impl Coordinator {
    pub fn new(
        config: &Config,
        lifecycle: Lifecycle,
        registry: SharedRegistry,
        clients: SharedClients,
        notifications: SharedNotifications,
        manifest_len: usize,
    ) -> Self {
        Self {
            lifecycle,
            registry,
            clients,
            notifications,
            names: PartitionNames::from_config(config),
            defaults: NotificationDefaults::from_config(config),
            origin: config.origin.clone(),
            role: config.role,
            policy: config.payload_policy,
            manifest_len,
            install_prompt: Arc::new(AtomicBool::new(false)),
        }
    }

    // == Sync ==
    /// Asks every page to sync its healthcare data. Other tags are ignored.
    ///
    /// Returns how many clients were notified.
    pub async fn handle_sync(&self, tag: &str) -> usize {
        if tag != HEALTHCARE_SYNC_TAG {
            debug!("Ignoring sync tag {}", tag);
            return 0;
        }
        info!("Background sync: {}", tag);
        self.clients
            .write()
            .await
            .broadcast(&ClientMessage::SyncHealthcareData {
                action: "start".to_string(),
            })
    }

    // == Push ==
    /// Shows a notification for a push payload.
    pub async fn handle_push(&self, raw: &[u8]) -> Result<Notification> {
        let payload = PushPayload::parse(raw, self.policy)?;
        let notification = Notification::from_push(payload, &self.defaults);
        Ok(self.notifications.write().await.show(notification))
    }

    /// Closes the notification; the `view` action opens a window at its URL.
    pub async fn handle_notification_click(
        &self,
        id: NotificationId,
        action: Option<&str>,
    ) -> Result<Option<ClientHandle>> {
        let Some(notification) = self.notifications.write().await.close(id) else {
            warn!("Click on unknown notification {:?}", id);
            return Ok(None);
        };

        if action != Some(ACTION_VIEW) {
            debug!("Notification {:?} dismissed", id);
            return Ok(None);
        }

        let target = notification.data.url.as_deref().unwrap_or("/");
        let url = self
            .origin
            .join(target)
            .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", target, e)))?;
        Ok(Some(self.clients.write().await.open_window(url)))
    }

    // == Messages ==
    /// Handles a page message. `GET_CACHE_STATUS` answers on `reply` when given.
    pub async fn handle_message(
        &self,
        raw: &[u8],
        reply: Option<oneshot::Sender<CacheStatusReply>>,
    ) -> Result<MessageOutcome> {
        match InboundMessage::parse(raw, self.policy)? {
            InboundMessage::SkipWaiting => {
                let activation = self.lifecycle.skip_waiting().await?;
                Ok(MessageOutcome::SkipWaiting { activation })
            }
            InboundMessage::GetCacheStatus => {
                let status = self.cache_status();
                if let Some(reply) = reply {
                    if reply.send(status.clone()).is_err() {
                        debug!("Cache status requester went away");
                    }
                }
                Ok(MessageOutcome::Status { status })
            }
            InboundMessage::CacheHealthcareData(Some(data)) => self.cache_healthcare_data(data).await,
            InboundMessage::CacheHealthcareData(None) => {
                warn!("CACHE_HEALTHCARE_DATA without url or response");
                Ok(MessageOutcome::Ignored)
            }
            InboundMessage::Unknown(kind) => {
                debug!("Ignoring message type '{}'", kind);
                Ok(MessageOutcome::Ignored)
            }
        }
    }

    pub fn cache_status(&self) -> CacheStatusReply {
        CacheStatusReply {
            cache_size: self.manifest_len,
            version: self.names.version.clone(),
            kind: self.role.to_string(),
        }
    }

    async fn cache_healthcare_data(&self, data: HealthcareDataPayload) -> Result<MessageOutcome> {
        let url = self
            .origin
            .join(&data.url)
            .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", data.url, e)))?;
        let key = RequestKey::get(&url);
        let response =
            Response::ok(data.response).with_header("content-type", "text/plain;charset=UTF-8");

        self.registry
            .write()
            .await
            .put(&self.names.data, key.clone(), &response);
        info!("Cached healthcare data from page: {}", key);
        Ok(MessageOutcome::DataCached {
            key: key.to_string(),
        })
    }

    // == Install Prompt ==
    /// Records a deferred install prompt and tells every page.
    pub async fn install_prompt_available(&self) -> usize {
        self.install_prompt.store(true, Ordering::SeqCst);
        self.clients
            .write()
            .await
            .broadcast(&ClientMessage::InstallPromptAvailable)
    }

    pub fn install_prompt_pending(&self) -> bool {
        self.install_prompt.load(Ordering::SeqCst)
    }
}
