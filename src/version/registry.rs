//! Registry trait for fetching the latest published version of a package

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Trait for looking up a package's latest version in a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the latest published version of a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "python313")
    ///
    /// # Returns
    /// * `Ok(String)` - The latest version string
    /// * `Err(RegistryError::NotFound)` - If the registry doesn't know the package
    /// * `Err(RegistryError)` - Any other failure
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError>;
}
