//! Notifications shown for push events.
//!
//! [`NotificationCenter`] stands in for the platform notification API: it
//! keeps the notifications currently displayed until they are clicked or
//! closed. A new notification replaces a displayed one with the same tag.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::messages::PushPayload;

pub const ACTION_VIEW: &str = "view";
pub const ACTION_DISMISS: &str = "dismiss";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Fallback values for fields a push payload leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
}

impl NotificationDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: format!("{} {}", config.display_name, config.role),
            body: format!("{} healthcare notification", config.display_name),
            icon: "/icon-192.png".to_string(),
            badge: "/favicon-96x96.png".to_string(),
            tag: format!("{}-health", config.app_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Assigned when shown
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    /// The payload it was built from; carries the click-through URL
    pub data: PushPayload,
}

impl Notification {
    /// Builds the notification for a push payload.
    pub fn from_push(payload: PushPayload, defaults: &NotificationDefaults) -> Self {
        Self {
            id: NotificationId(0),
            title: payload.title.clone().unwrap_or_else(|| defaults.title.clone()),
            body: payload.body.clone().unwrap_or_else(|| defaults.body.clone()),
            icon: payload.icon.clone().unwrap_or_else(|| defaults.icon.clone()),
            badge: defaults.badge.clone(),
            tag: payload.tag.clone().unwrap_or_else(|| defaults.tag.clone()),
            require_interaction: payload.urgent.unwrap_or(false),
            actions: vec![
                NotificationAction {
                    action: ACTION_VIEW.to_string(),
                    title: "View".to_string(),
                    icon: Some(defaults.icon.clone()),
                },
                NotificationAction {
                    action: ACTION_DISMISS.to_string(),
                    title: "Dismiss".to_string(),
                    icon: None,
                },
            ],
            data: payload,
        }
    }
}

/// Displayed notifications.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: BTreeMap<NotificationId, Notification>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displays a notification, replacing any displayed one with the same tag.
    pub fn show(&mut self, mut notification: Notification) -> Notification {
        let replaced: Vec<NotificationId> = self
            .shown
            .values()
            .filter(|shown| shown.tag == notification.tag)
            .map(|shown| shown.id)
            .collect();
        for id in replaced {
            debug!("Replacing notification {:?} with tag {}", id, notification.tag);
            self.shown.remove(&id);
        }

        self.next_id += 1;
        notification.id = NotificationId(self.next_id);
        info!("Showing notification {:?}: {}", notification.id, notification.title);
        self.shown.insert(notification.id, notification.clone());
        notification
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.shown.get(&id)
    }

    pub fn close(&mut self, id: NotificationId) -> Option<Notification> {
        self.shown.remove(&id)
    }

    /// Displayed notifications, oldest first.
    pub fn displayed(&self) -> Vec<&Notification> {
        self.shown.values().collect()
    }
}

pub type SharedNotifications = Arc<RwLock<NotificationCenter>>;
