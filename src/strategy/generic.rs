//! Generic resources: network-first with shell partition fallback.

use tracing::{info, warn};

use crate::cache::RequestKey;
use crate::error::Result;
use crate::fetch::{Request, Response};
use crate::strategy::Strategies;

impl Strategies {
    pub async fn generic(&self, request: &Request) -> Result<Response> {
        match self.network(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.registry.write().await.put(
                        &self.names.shell,
                        RequestKey::from(request),
                        &response,
                    );
                    info!("Cached resource: {}", request.url);
                }
                Ok(response)
            }
            Err(e) => {
                let cached = self
                    .registry
                    .write()
                    .await
                    .match_request(&self.names.shell, request);
                match cached {
                    Some(cached) => {
                        info!("Fallback from cache: {}", request.url);
                        Ok(cached)
                    }
                    None => {
                        warn!("Request failed completely: {} ({})", request.url, e);
                        Err(e)
                    }
                }
            }
        }
    }
}
