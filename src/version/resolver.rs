//! Remote version resolution
//!
//! Looks up the latest version of many packages at once. Each lookup ends in
//! one of three outcomes:
//! - found: the version goes into the result
//! - not found: the package is left out of the result
//! - failed: the whole batch fails with that error
//!
//! A package missing from the returned map is the "unknown" signal, not an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use indexmap::IndexSet;
use tracing::{debug, info};

use crate::config::FETCH_TIMEOUT_MS;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Outcome of a single lookup
#[derive(Debug)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
    Failed(RegistryError),
}

/// Resolves latest versions for a batch of package names
pub struct RemoteResolver {
    registry: Arc<dyn Registry>,
    request_timeout: Duration,
    /// `None` issues every lookup at once
    max_concurrency: Option<usize>,
}

impl RemoteResolver {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            request_timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
            max_concurrency: None,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Look up a single package, bounded by the request timeout
    pub async fn lookup(&self, package_name: &str) -> LookupOutcome {
        let fetch = self.registry.fetch_latest_version(package_name);
        match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(Ok(version)) => LookupOutcome::Found(version),
            Ok(Err(RegistryError::NotFound(_))) => LookupOutcome::NotFound,
            Ok(Err(e)) => LookupOutcome::Failed(e),
            Err(_) => LookupOutcome::Failed(RegistryError::Timeout {
                name: package_name.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }

    /// Resolve the latest version of every name
    ///
    /// The first failed lookup aborts the batch; lookups still in flight are
    /// dropped and no partial map is returned.
    pub async fn resolve_versions(
        &self,
        names: &IndexSet<String>,
    ) -> Result<HashMap<String, String>, RegistryError> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let limit = self.max_concurrency.unwrap_or(names.len()).max(1);
        let mut lookups = stream::iter(names.iter().cloned())
            .map(|name| async move {
                let outcome = self.lookup(&name).await;
                (name, outcome)
            })
            .buffer_unordered(limit);

        let mut versions = HashMap::with_capacity(names.len());
        let mut not_found = 0usize;

        while let Some((name, outcome)) = lookups.next().await {
            match outcome {
                LookupOutcome::Found(version) => {
                    debug!("Resolved {} -> {}", name, version);
                    versions.insert(name, version);
                }
                LookupOutcome::NotFound => {
                    debug!("Package not found upstream: {}", name);
                    not_found += 1;
                }
                LookupOutcome::Failed(e) => return Err(e),
            }
        }

        info!(
            "Resolved {} of {} packages ({} not found upstream)",
            versions.len(),
            names.len(),
            not_found
        );

        Ok(versions)
    }
}
