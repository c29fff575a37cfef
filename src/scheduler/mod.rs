//! Reconciliation scheduling
//!
//! # Modules
//!
//! - [`engine`]: Scheduler, triggers and the single driver task
//! - [`gate`]: Idle/Running admission with one coalesced rerun
//! - [`pipeline`]: One reconciliation run and its publication
//! - [`snapshot`]: Published result and loading flag
//! - [`watcher`]: Debounced filesystem watch

pub mod engine;
pub mod gate;
pub mod pipeline;
pub mod snapshot;
pub mod watcher;
