//! Page Mailboxes
//!
//! The gateway keeps the receiving end of each registered page's channel here
//! until the page polls it. Dropping a mailbox closes the channel, so the next
//! broadcast prunes the page.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc::UnboundedReceiver, Mutex};
use tokio::time::Instant;

use crate::clients::{ClientHandle, ClientId};
use crate::messages::ClientMessage;

struct Mailbox {
    receiver: UnboundedReceiver<ClientMessage>,
    last_polled: Instant,
}

#[derive(Clone, Default)]
pub struct Mailboxes {
    inner: Arc<Mutex<HashMap<ClientId, Mailbox>>>,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keep(&self, handle: ClientHandle) {
        let mailbox = Mailbox {
            receiver: handle.receiver,
            last_polled: Instant::now(),
        };
        self.inner.lock().await.insert(handle.id, mailbox);
    }

    /// Takes every message queued for `id`. `None` if the page is unknown.
    pub async fn drain(&self, id: ClientId) -> Option<Vec<ClientMessage>> {
        let mut inner = self.inner.lock().await;
        let mailbox = inner.get_mut(&id)?;
        mailbox.last_polled = Instant::now();

        let mut messages = Vec::new();
        while let Ok(message) = mailbox.receiver.try_recv() {
            messages.push(message);
        }
        Some(messages)
    }

    /// Drops the mailbox for `id`, closing its channel.
    pub async fn remove(&self, id: ClientId) -> bool {
        self.inner.lock().await.remove(&id).is_some()
    }

    /// Drops every mailbox not polled within `idle`. Returns their ids, sorted.
    pub async fn evict_idle(&self, idle: Duration) -> Vec<ClientId> {
        let mut inner = self.inner.lock().await;
        let mut evicted: Vec<ClientId> = inner
            .iter()
            .filter(|(_, mailbox)| mailbox.last_polled.elapsed() >= idle)
            .map(|(id, _)| *id)
            .collect();
        for id in &evicted {
            inner.remove(id);
        }
        evicted.sort();
        evicted
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
