//! MacPorts ports API implementation

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::config::{DEFAULT_REGISTRY_URL, FETCH_TIMEOUT_MS};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Response from `GET <base>/ports/<name>/`
#[derive(Debug, Deserialize)]
struct PortResponse {
    version: String,
}

/// Registry implementation for the MacPorts ports API
#[derive(Clone)]
pub struct MacPortsRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl MacPortsRegistry {
    /// Creates a new MacPortsRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_millis(FETCH_TIMEOUT_MS))
    }

    /// Creates a new MacPortsRegistry whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("port-status/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn port_url(&self, package_name: &str) -> String {
        format!("{}/ports/{}/", self.base_url, package_name)
    }
}

impl Default for MacPortsRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl Registry for MacPortsRegistry {
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let url = self.port_url(package_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("MacPorts registry returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus {
                name: package_name.to_string(),
                status: status.as_u16(),
            });
        }

        let port: PortResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse MacPorts registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(port.version)
    }
}
