//! Idle Client Sweep
//!
//! Background task that disconnects registered pages which stopped polling.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Spawns a task that, every `idle` interval, disconnects pages not polled
/// within `idle`.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_idle_client_sweep(state: AppState, idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting idle client sweep with a {:?} window", idle);

        loop {
            tokio::time::sleep(idle).await;

            let evicted = state.evict_idle_clients(idle).await;
            if evicted == 0 {
                debug!("Idle sweep: every page is active");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::test_support::{url, ScriptedFetcher};
    use crate::worker::ServiceWorker;

    async fn state_with_page() -> AppState {
        let worker = ServiceWorker::new(Config::default(), Arc::new(ScriptedFetcher::new()));
        worker.start().await.unwrap();
        let state = AppState::new(worker);
        let handle = state.worker.clients().write().await.connect(url("/"));
        state.mailboxes().keep(handle).await;
        state
    }

    #[tokio::test]
    async fn test_sweep_disconnects_silent_pages() {
        let state = state_with_page().await;

        let handle = spawn_idle_client_sweep(state.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(state.mailboxes().is_empty().await);
        assert!(state.worker.clients().read().await.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let state = state_with_page().await;

        let handle = spawn_idle_client_sweep(state.clone(), Duration::from_secs(60));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
        assert_eq!(state.mailboxes().len().await, 1);
    }
}
