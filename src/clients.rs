//! Clients and the client notifier.
//!
//! Every open page is a [`Client`] with a message channel. Broadcasting posts a
//! [`ClientMessage`] to each of them: no retry, no acknowledgement, no
//! ordering across clients. Pages that have gone away are pruned on the next
//! broadcast.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use url::Url;

use crate::messages::ClientMessage;

/// Unique identifier for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// How the client came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    /// A tab that was already open
    Window,
    /// A window opened by the worker (notification click)
    OpenedWindow,
}

/// A page the worker can post to.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub url: Url,
    pub client_type: ClientType,
    /// Controlled by the current worker (set by `claim`)
    pub controlled: bool,
    sender: mpsc::UnboundedSender<ClientMessage>,
}

impl Client {
    /// Posts a message; false if the page has gone away.
    pub fn post_message(&self, message: ClientMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// The page side of a client: its id and the receiving end of its channel.
#[derive(Debug)]
pub struct ClientHandle {
    pub id: ClientId,
    pub url: Url,
    pub receiver: mpsc::UnboundedReceiver<ClientMessage>,
}

/// All clients within the worker's scope.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<ClientId, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an open page. It stays uncontrolled until the next `claim`.
    pub fn connect(&mut self, url: Url) -> ClientHandle {
        self.insert(url, ClientType::Window, false)
    }

    /// Opens a new window at `url`. Windows opened by the worker are controlled.
    pub fn open_window(&mut self, url: Url) -> ClientHandle {
        info!("Opening window at {}", url);
        self.insert(url, ClientType::OpenedWindow, true)
    }

    fn insert(&mut self, url: Url, client_type: ClientType, controlled: bool) -> ClientHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = ClientId::next();
        self.clients.insert(
            id,
            Client {
                id,
                url: url.clone(),
                client_type,
                controlled,
                sender,
            },
        );
        ClientHandle { id, url, receiver }
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    /// Takes control of every client. Returns how many were newly claimed.
    pub fn claim(&mut self) -> usize {
        let mut claimed = 0;
        for client in self.clients.values_mut() {
            if !client.controlled {
                client.controlled = true;
                claimed += 1;
            }
        }
        debug!("Claimed {} clients", claimed);
        claimed
    }

    /// Posts `message` to every client. Returns how many received it.
    pub fn broadcast(&mut self, message: &ClientMessage) -> usize {
        let mut gone = Vec::new();
        let mut delivered = 0;
        for client in self.clients.values() {
            if client.post_message(message.clone()) {
                delivered += 1;
            } else {
                gone.push(client.id);
            }
        }
        for id in gone {
            debug!("Dropping closed client {}", id);
            self.clients.remove(&id);
        }
        info!("Broadcast {:?} to {} clients", message, delivered);
        delivered
    }

    /// Client ids, sorted.
    pub fn ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Clients as shared between handlers.
pub type SharedClients = Arc<RwLock<Clients>>;
