pub mod config;
pub mod inventory;
pub mod logging;
pub mod report;
pub mod scheduler;
pub mod version;
