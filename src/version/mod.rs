//! Version layer for port status checking
//!
//! Resolves the latest published versions of installed ports and merges
//! them with the local inventory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Inventory  │────▶│   Checker   │◀────│  Resolver   │
//! │  (records)  │     │ (reconcile) │     │  (fan-out)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │  Registry   │
//!                                         │ (MacPorts)  │
//!                                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Status derivation and reconciliation
//! - [`resolver`]: Concurrent batch lookups with not-found tolerance
//! - [`registry`]: Registry trait for fetching versions from remote sources
//! - [`registries`]: Concrete registry implementations
//! - [`error`]: Error types for registry lookups and reconciliation runs

pub mod checker;
pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
