//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use port_status::config::Config;
use port_status::inventory::command::CommandRunner;
use port_status::scheduler::pipeline::Pipeline;
use port_status::version::error::RegistryError;
use port_status::version::registry::Registry;

/// Mock registry for testing
pub struct MockRegistry {
    versions: HashMap<String, String>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    pub fn with_version(mut self, package: &str, version: &str) -> Self {
        self.versions
            .insert(package.to_string(), version.to_string());
        self
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        match self.versions.get(package_name) {
            Some(version) => Ok(version.clone()),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }
}

/// Create a pipeline with default config around the given collaborators
pub fn create_test_pipeline(
    runner: Arc<dyn CommandRunner>,
    registry: Arc<dyn Registry>,
) -> Arc<Pipeline> {
    Arc::new(Pipeline::from_config(&Config::default(), runner, registry))
}
