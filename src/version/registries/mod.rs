//! Registry implementations for fetching package versions

pub mod macports;

pub use macports::MacPortsRegistry;
