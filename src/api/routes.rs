//! API Routes
//!
//! Configures the Axum router: the control API under `/__sw` and the proxy
//! fallback for everything else.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    client_messages_handler, connect_client_handler, disconnect_client_handler, health_handler,
    install_prompt_handler, message_handler, notification_click_handler, proxy_handler,
    push_handler, status_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__sw/clients` - Register an open page
/// - `DELETE /__sw/clients/:id` - Forget a page that went away
/// - `GET /__sw/clients/:id/messages` - Drain a page's messages
/// - `POST /__sw/message` - Post a message to the worker
/// - `POST /__sw/push` - Deliver a push payload
/// - `POST /__sw/sync` - Fire a background sync
/// - `POST /__sw/notificationclick` - Click a notification
/// - `POST /__sw/install-prompt` - Announce a deferred install prompt
/// - `GET /__sw/status` - Lifecycle state, partitions and stats
/// - `GET /__sw/health` - Health check endpoint
/// - anything else - Proxied through the worker
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let control = Router::new()
        .route("/clients", post(connect_client_handler))
        .route("/clients/:id", delete(disconnect_client_handler))
        .route("/clients/:id/messages", get(client_messages_handler))
        .route("/message", post(message_handler))
        .route("/push", post(push_handler))
        .route("/sync", post(sync_handler))
        .route("/notificationclick", post(notification_click_handler))
        .route("/install-prompt", post(install_prompt_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler));

    Router::new()
        .nest("/__sw", control)
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::fetch::Response as WorkerResponse;
    use crate::test_support::ScriptedFetcher;
    use crate::worker::ServiceWorker;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn create_test_app(fetcher: Arc<ScriptedFetcher>) -> Router {
        let worker = ServiceWorker::new(Config::default(), fetcher);
        worker.start().await.unwrap();
        create_router(AppState::new(worker))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_proxy_serves_cached_shell() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/styles.css", WorkerResponse::ok("body{}"));
        let app = create_test_app(fetcher.clone()).await;
        fetcher.go_offline();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/styles.css")
                    .header("sec-fetch-dest", "style")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "HIT");
    }

    #[tokio::test]
    async fn test_proxy_offline_navigation_without_fallback() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/settings.html")
                    .header("sec-fetch-mode", "navigate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_sync_endpoint_requires_tag() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/__sw/sync")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
