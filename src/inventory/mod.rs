//! Local package inventory
//!
//! Turns the package manager's own text output into an ordered list of
//! installed packages.
//!
//! # Modules
//!
//! - [`command`]: Runs package manager commands through a shell
//! - [`parser`]: Extracts package records from command output
//! - [`pattern`]: Version and name token patterns
//! - [`types`]: `PackageRecord` and helpers

pub mod command;
pub mod parser;
pub mod pattern;
pub mod types;
