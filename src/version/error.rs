use std::time::Duration;

use thiserror::Error;

use crate::inventory::command::CommandError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status} for {name}")]
    UnexpectedStatus { name: String, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Lookup for {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Failure of a whole reconciliation run
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Inventory command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Registry lookup failed: {0}")]
    Registry(#[from] RegistryError),
}
