//! App shell: cache-first, never refreshed in the background.

use tracing::{info, warn};

use crate::cache::RequestKey;
use crate::error::Result;
use crate::fetch::{Request, Response};
use crate::manifest::{OFFLINE_PAGE, ROOT_DOCUMENT};
use crate::strategy::Strategies;

impl Strategies {
    /// Serves the shell partition copy if present; otherwise fetches and
    /// stores it. A failed navigation falls back to the offline page, then to
    /// the root document.
    pub async fn app_shell(&self, request: &Request) -> Result<Response> {
        let cached = self
            .registry
            .write()
            .await
            .match_request(&self.names.shell, request);

        if let Some(cached) = cached {
            info!("App shell from cache: {}", request.url);
            return Ok(cached);
        }

        match self.network(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.registry.write().await.put(
                        &self.names.shell,
                        RequestKey::from(request),
                        &response,
                    );
                    info!("Cached app shell: {}", request.url);
                }
                Ok(response)
            }
            Err(e) => {
                warn!("App shell request failed: {} ({})", request.url, e);
                if request.is_navigation() {
                    if let Some(fallback) = self.navigation_fallback().await {
                        return Ok(fallback);
                    }
                }
                Err(e)
            }
        }
    }

    async fn navigation_fallback(&self) -> Option<Response> {
        let mut registry = self.registry.write().await;
        for path in [OFFLINE_PAGE, ROOT_DOCUMENT] {
            let Ok(url) = self.origin.join(path) else {
                continue;
            };
            if let Some(response) = registry.match_url(&self.names.shell, &url) {
                info!("Serving {} for failed navigation", path);
                return Some(response);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::cache::RequestKey;
    use crate::fetch::{Request, Response};
    use crate::strategy::test_strategies;
    use crate::test_support::{url, ScriptedFetcher};

    const SHELL: &str = "thynktech-admin-cache-v1";

    #[tokio::test]
    async fn test_hit_never_touches_network() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        registry
            .write()
            .await
            .put(SHELL, RequestKey::get(&url("/styles.css")), &Response::ok("body{}"));
        fetcher.respond("/styles.css", Response::ok("changed"));

        let response = strategies.app_shell(&Request::get(url("/styles.css"))).await.unwrap();
        assert_eq!(response.text(), "body{}");
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(strategies.refreshes.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher.clone());
        fetcher.respond("/app.js", Response::ok("console.log(1)"));

        let first = strategies.app_shell(&Request::get(url("/app.js"))).await.unwrap();
        assert!(!first.from_cache);

        fetcher.go_offline();
        let second = strategies.app_shell(&Request::get(url("/app.js"))).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.text(), "console.log(1)");
        assert_eq!(registry.read().await.len(SHELL), 1);
    }

    #[tokio::test]
    async fn test_failed_navigation_serves_offline_page() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher);
        {
            let mut registry = registry.write().await;
            registry.put(SHELL, RequestKey::get(&url("/offline.html")), &Response::ok("offline"));
            registry.put(SHELL, RequestKey::get(&url("/index.html")), &Response::ok("index"));
        }

        let response = strategies
            .app_shell(&Request::navigate(url("/settings.html")))
            .await
            .unwrap();
        assert_eq!(response.text(), "offline");
    }

    #[tokio::test]
    async fn test_failed_navigation_falls_back_to_root_document() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher);
        registry
            .write()
            .await
            .put(SHELL, RequestKey::get(&url("/index.html")), &Response::ok("index"));

        let response = strategies
            .app_shell(&Request::navigate(url("/settings.html")))
            .await
            .unwrap();
        assert_eq!(response.text(), "index");
    }

    #[tokio::test]
    async fn test_failed_navigation_without_fallback_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, _registry) = test_strategies(fetcher);

        let result = strategies.app_shell(&Request::navigate(url("/settings.html"))).await;
        assert!(result.unwrap_err().is_network_failure());
    }

    #[tokio::test]
    async fn test_failed_subresource_propagates_even_with_offline_page() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (strategies, registry) = test_strategies(fetcher);
        registry
            .write()
            .await
            .put(SHELL, RequestKey::get(&url("/offline.html")), &Response::ok("offline"));

        let result = strategies.app_shell(&Request::get(url("/theme.css"))).await;
        assert!(result.is_err());
    }
}
