//! Healthcare data: stale-while-revalidate.

use tracing::{info, warn};

use crate::cache::RequestKey;
use crate::error::Result;
use crate::fetch::{Request, Response};
use crate::strategy::Strategies;

impl Strategies {
    /// Serves a cached copy at once and refreshes it in the background; with
    /// nothing cached, goes to the network and falls back to the offline
    /// placeholder for API-like requests.
    pub async fn healthcare_data(&self, request: &Request) -> Result<Response> {
        let cached = self
            .registry
            .write()
            .await
            .match_request(&self.names.data, request);

        if let Some(cached) = cached {
            info!("Healthcare data from cache: {}", request.url);
            self.refreshes
                .spawn_refresh(
                    self.registry.clone(),
                    self.fetcher.clone(),
                    self.names.data.clone(),
                    request.clone(),
                    self.deadline,
                )
                .await;
            return Ok(cached);
        }

        match self.network(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.registry.write().await.put(
                        &self.names.data,
                        RequestKey::from(request),
                        &response,
                    );
                    info!("Cached new healthcare data: {}", request.url);
                }
                Ok(response)
            }
            Err(e) if request.is_api_like() => {
                warn!("Healthcare data request failed, answering offline: {} ({})", request.url, e);
                Ok(Response::offline_placeholder())
            }
            Err(e) => {
                warn!("Healthcare data request failed: {} ({})", request.url, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::Value;

    use crate::fetch::{Destination, Request, Response};
    use crate::strategy::test_strategies;
    use crate::test_support::{url, ScriptedFetcher};

    const DATA: &str = "thynktech-admin-data-v1";

    #[tokio::test]
    async fn test_hit_is_served_without_waiting_on_network() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        let request = Request::get(url("/patients/list"));
        registry
            .write()
            .await
            .put(DATA, (&request).into(), &Response::ok("cached"));

        fetcher.respond("/patients/list", Response::ok("fresh"));
        fetcher.set_delay(Duration::from_secs(30));

        let response = tokio::time::timeout(
            Duration::from_millis(200),
            strategies.healthcare_data(&request),
        )
        .await
        .expect("cached data must not wait on the network")
        .unwrap();

        assert!(response.from_cache);
        assert_eq!(response.text(), "cached");
        strategies.refreshes.abort_all().await;
    }

    #[tokio::test]
    async fn test_background_refresh_updates_next_read() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        let request = Request::get(url("/appointments"));
        registry
            .write()
            .await
            .put(DATA, (&request).into(), &Response::ok("v1"));
        fetcher.respond("/appointments", Response::ok("v2"));

        let first = strategies.healthcare_data(&request).await.unwrap();
        assert_eq!(first.text(), "v1");
        strategies.refreshes.settle().await;

        let second = strategies.healthcare_data(&request).await.unwrap();
        assert_eq!(second.text(), "v2");
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_swallowed() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        let request = Request::get(url("/visits"));
        registry
            .write()
            .await
            .put(DATA, (&request).into(), &Response::ok("kept"));

        strategies.healthcare_data(&request).await.unwrap();
        strategies.refreshes.settle().await;

        let again = strategies.healthcare_data(&request).await.unwrap();
        assert_eq!(again.text(), "kept");
    }

    #[tokio::test]
    async fn test_miss_stores_200() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        fetcher.respond("/reports/monthly", Response::ok("report"));

        let request = Request::get(url("/reports/monthly"));
        let response = strategies.healthcare_data(&request).await.unwrap();
        assert!(!response.from_cache);
        assert_eq!(registry.read().await.len(DATA), 1);
    }

    #[tokio::test]
    async fn test_miss_passes_other_statuses_uncached() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        fetcher.respond("/services", Response::new(201, "created"));
        fetcher.respond("/registers", Response::new(404, "missing"));

        let created = strategies
            .healthcare_data(&Request::get(url("/services")))
            .await
            .unwrap();
        let missing = strategies
            .healthcare_data(&Request::get(url("/registers")))
            .await
            .unwrap();

        assert_eq!(created.status, 201);
        assert_eq!(missing.status, 404);
        assert_eq!(registry.read().await.len(DATA), 0);
    }

    #[tokio::test]
    async fn test_offline_unseen_data_gets_placeholder() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, _registry) = test_strategies(fetcher);

        let response = strategies
            .healthcare_data(&Request::get(url("/patients/list")))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_offline_placeholder());
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["offline"], true);
    }

    #[tokio::test]
    async fn test_offline_navigation_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, _registry) = test_strategies(fetcher);

        let result = strategies
            .healthcare_data(&Request::navigate(url("/patients.html")))
            .await;
        assert!(result.unwrap_err().is_network_failure());

        let result = strategies
            .healthcare_data(&Request::get(url("/patients.js")).with_destination(Destination::Script))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_slow_network_hits_deadline() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, _registry) = test_strategies(fetcher.clone());
        fetcher.respond("/api/patients", Response::ok("late"));
        fetcher.set_delay(Duration::from_secs(30));

        // Deadline is 500ms in the test strategies
        let response = strategies
            .healthcare_data(&Request::get(url("/api/patients")))
            .await
            .unwrap();
        assert!(response.is_offline_placeholder());
    }
}
