//! Strategy Handlers
//!
//! Three independent request-fulfilment policies, one per [`RequestCategory`]:
//!
//! - healthcare data: stale-while-revalidate against the data partition
//! - app shell: cache-first against the shell partition, no refresh
//! - generic: network-first, falling back to the shell partition
//!
//! Each call handles one request to completion. The only shared state is the
//! cache registry.

mod data;
mod generic;
mod shell;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::cache::{PartitionNames, SharedRegistry};
use crate::classify::RequestCategory;
use crate::error::Result;
use crate::fetch::{fetch_with_deadline, Fetcher, Request, Response};
use crate::tasks::RefreshTasks;

/// Everything a strategy needs, passed in rather than read from globals.
#[derive(Clone)]
pub struct Strategies {
    registry: SharedRegistry,
    fetcher: Arc<dyn Fetcher>,
    names: PartitionNames,
    origin: Url,
    deadline: Duration,
    refreshes: RefreshTasks,
}

impl Strategies {
    pub fn new(
        registry: SharedRegistry,
        fetcher: Arc<dyn Fetcher>,
        names: PartitionNames,
        origin: Url,
        deadline: Duration,
        refreshes: RefreshTasks,
    ) -> Self {
        Self {
            registry,
            fetcher,
            names,
            origin,
            deadline,
            refreshes,
        }
    }

    /// Runs the strategy for `category`.
    pub async fn handle(&self, category: RequestCategory, request: &Request) -> Result<Response> {
        match category {
            RequestCategory::HealthcareData => self.healthcare_data(request).await,
            RequestCategory::AppShell => self.app_shell(request).await,
            RequestCategory::Generic => self.generic(request).await,
        }
    }

    async fn network(&self, request: &Request) -> Result<Response> {
        fetch_with_deadline(self.fetcher.as_ref(), request, self.deadline).await
    }
}

#[cfg(test)]
pub(crate) fn test_strategies(
    fetcher: Arc<crate::test_support::ScriptedFetcher>,
) -> (Strategies, SharedRegistry) {
    use crate::config::Role;
    use crate::test_support::ORIGIN;

    let registry = crate::cache::shared_registry();
    let strategies = Strategies::new(
        registry.clone(),
        fetcher,
        PartitionNames::new("thynktech", Role::Admin, "1"),
        Url::parse(ORIGIN).unwrap(),
        Duration::from_millis(500),
        RefreshTasks::new(),
    );
    (strategies, registry)
}
