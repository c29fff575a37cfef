//! Shared test utilities

#![allow(dead_code)]

mod command;
mod registry;

pub use command::ScriptedRunner;
pub use registry::{MockRegistry, create_test_pipeline};
