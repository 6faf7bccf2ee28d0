//! API Handlers
//!
//! The proxy fallback that runs page requests through the worker, and the
//! control endpoints that deliver platform events to it.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::HeaderName, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::clients::{ClientHandle, ClientId};
use crate::coordinator::MessageOutcome;
use crate::error::{Result, WorkerError};
use crate::fetch::{fetch_with_deadline, Destination, Request, Response as WorkerResponse};
use crate::models::{
    ClientMessagesResponse, ConnectClientRequest, ConnectClientResponse,
    DisconnectClientResponse, HealthResponse,
    NotificationClickRequest, NotificationClickResponse, NotifiedResponse, SyncRequest,
    WindowInfo,
};
use crate::notifications::{Notification, NotificationId};
use crate::worker::{EventOutcome, FetchOutcome, ServiceWorker, WorkerEvent, WorkerStatus};

use super::mailboxes::Mailboxes;

/// Marks whether a response came from a cache partition.
const CACHE_STATUS_HEADER: &str = "x-cache";

/// Application state shared across all handlers.
///
/// Holds the worker and, for each connected client, the receiving end of its
/// message channel until the page polls it or goes away.
#[derive(Clone)]
pub struct AppState {
    pub worker: ServiceWorker,
    mailboxes: Mailboxes,
}

impl AppState {
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker,
            mailboxes: Mailboxes::new(),
        }
    }

    pub fn mailboxes(&self) -> &Mailboxes {
        &self.mailboxes
    }

    async fn keep_mailbox(&self, handle: ClientHandle) {
        self.mailboxes.keep(handle).await;
    }

    /// Forgets a page. Returns false if it was not registered.
    pub async fn disconnect(&self, id: ClientId) -> bool {
        let had_mailbox = self.mailboxes.remove(id).await;
        let had_client = self.worker.clients().write().await.remove(id).is_some();
        had_mailbox || had_client
    }

    /// Disconnects every page that has not polled within `idle`.
    /// Returns how many were dropped.
    pub async fn evict_idle_clients(&self, idle: Duration) -> usize {
        let evicted = self.mailboxes.evict_idle(idle).await;
        if evicted.is_empty() {
            return 0;
        }
        let mut clients = self.worker.clients().write().await;
        for id in &evicted {
            clients.remove(*id);
        }
        info!("Disconnected {} idle clients", evicted.len());
        evicted.len()
    }
}

fn unexpected(outcome: EventOutcome) -> WorkerError {
    WorkerError::Internal(format!("unexpected event outcome: {:?}", outcome))
}

// == Proxy ==
/// Fallback handler for every page request.
///
/// Same-origin GETs go through the worker's strategies; anything the worker
/// passes through is fetched from the network as is.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request = build_request(state.worker.origin(), &method, &uri, &headers, body)?;

    let response = match state.worker.fetch(request.clone()).await? {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::Passthrough => {
            debug!("Forwarding {} {}", request.method, request.url);
            fetch_with_deadline(
                state.worker.fetcher().as_ref(),
                &request,
                state.worker.config().fetch_timeout(),
            )
            .await?
        }
    };

    Ok(into_http_response(response))
}

fn build_request(
    origin: &url::Url,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Request> {
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = origin
        .join(target)
        .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", target, e)))?;

    let mut request = Request::new(method.as_str(), url)
        .with_destination(destination(headers))
        .with_body(body);
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    Ok(request)
}

/// Derives the destination from fetch metadata, falling back to `Accept`.
fn destination(headers: &HeaderMap) -> Destination {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(dest) = header("sec-fetch-dest") {
        return Destination::from_fetch_dest(dest);
    }
    if header("sec-fetch-mode") == Some("navigate") {
        return Destination::Document;
    }
    match header("accept") {
        Some(accept) if accept.contains("text/html") => Destination::Document,
        _ => Destination::Other,
    }
}

fn into_http_response(response: WorkerResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let cache_status = if response.from_cache { "HIT" } else { "MISS" };

    let mut out = (status, response.body).into_response();
    let out_headers = out.headers_mut();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            out_headers.insert(name, value);
        }
    }
    out_headers.insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    out
}

// == Clients ==
/// Handler for POST /__sw/clients
pub async fn connect_client_handler(
    State(state): State<AppState>,
    Json(req): Json<ConnectClientRequest>,
) -> Result<Json<ConnectClientResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(WorkerError::InvalidUrl(error_msg));
    }
    let url = state
        .worker
        .origin()
        .join(&req.url)
        .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", req.url, e)))?;

    let handle = state.worker.clients().write().await.connect(url);
    let response = ConnectClientResponse::new(handle.id.as_u64(), handle.url.as_str());
    state.keep_mailbox(handle).await;
    Ok(Json(response))
}

/// Handler for GET /__sw/clients/:id/messages
///
/// Drains the messages posted to the client since the last poll.
pub async fn client_messages_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ClientMessagesResponse>> {
    let client = ClientId::from(id);
    let messages = state
        .mailboxes
        .drain(client)
        .await
        .ok_or_else(|| WorkerError::NotFound(client.to_string()))?;

    Ok(Json(ClientMessagesResponse {
        client: id,
        messages,
    }))
}

/// Handler for DELETE /__sw/clients/:id
///
/// Called when a page unloads; later broadcasts skip it.
pub async fn disconnect_client_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DisconnectClientResponse>> {
    let client = ClientId::from(id);
    if !state.disconnect(client).await {
        return Err(WorkerError::NotFound(client.to_string()));
    }
    debug!("Client {} disconnected", client);
    Ok(Json(DisconnectClientResponse::new(id)))
}

// == Events ==
/// Handler for POST /__sw/message
pub async fn message_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageOutcome>> {
    let event = WorkerEvent::Message {
        data: body,
        reply: None,
    };
    match state.worker.dispatch(event).await? {
        EventOutcome::Message(outcome) => Ok(Json(outcome)),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /__sw/push
pub async fn push_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Notification>> {
    match state.worker.dispatch(WorkerEvent::Push { payload: body }).await? {
        EventOutcome::NotificationShown(notification) => Ok(Json(notification)),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /__sw/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<NotifiedResponse>> {
    match state.worker.dispatch(WorkerEvent::Sync { tag: req.tag }).await? {
        EventOutcome::Synced(notified) => Ok(Json(NotifiedResponse { notified })),
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /__sw/notificationclick
pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(req): Json<NotificationClickRequest>,
) -> Result<Json<NotificationClickResponse>> {
    let event = WorkerEvent::NotificationClick {
        id: NotificationId(req.id),
        action: req.action,
    };
    match state.worker.dispatch(event).await? {
        EventOutcome::NotificationClicked(Some(handle)) => {
            let window = WindowInfo::from(&handle);
            state.keep_mailbox(handle).await;
            Ok(Json(NotificationClickResponse {
                window: Some(window),
            }))
        }
        EventOutcome::NotificationClicked(None) => {
            Ok(Json(NotificationClickResponse { window: None }))
        }
        other => Err(unexpected(other)),
    }
}

/// Handler for POST /__sw/install-prompt
pub async fn install_prompt_handler(
    State(state): State<AppState>,
) -> Result<Json<NotifiedResponse>> {
    match state.worker.dispatch(WorkerEvent::InstallPromptAvailable).await? {
        EventOutcome::InstallPromptAnnounced(notified) => Ok(Json(NotifiedResponse { notified })),
        other => Err(unexpected(other)),
    }
}

// == Introspection ==
/// Handler for GET /__sw/status
pub async fn status_handler(State(state): State<AppState>) -> Json<WorkerStatus> {
    Json(state.worker.status().await)
}

/// Handler for GET /__sw/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
