//! Version status derivation and reconciliation

use std::collections::HashMap;

use crate::inventory::types::{PackageRecord, collapse_duplicates};

/// Status of an installed package relative to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortStatus {
    /// Installed version equals the latest version
    Latest,
    /// Installed version differs from the latest version
    ///
    /// This includes installs that are newer than what the registry reports.
    Outdated,
    /// No latest version is known
    Unknown,
}

impl PortStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortStatus::Latest => "latest",
            PortStatus::Outdated => "outdated",
            PortStatus::Unknown => "unknown",
        }
    }
}

impl PackageRecord {
    /// Derive the status of this record
    pub fn status(&self) -> PortStatus {
        match &self.latest_version {
            Some(latest) if *latest == self.installed_version => PortStatus::Latest,
            Some(_) => PortStatus::Outdated,
            None => PortStatus::Unknown,
        }
    }
}

/// Merge the local inventory with the remote versions
///
/// Every record is recomputed from scratch: a record whose name is missing
/// from `remote` ends up without a latest version even if an earlier run
/// knew one. Order follows the inventory; duplicate names collapse to one.
pub fn reconcile(
    inventory: &[PackageRecord],
    remote: &HashMap<String, String>,
) -> Vec<PackageRecord> {
    let merged = inventory
        .iter()
        .map(|record| record.with_latest(remote.get(&record.name).cloned()))
        .collect();
    collapse_duplicates(merged)
}

/// Count of records per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub latest: usize,
    pub outdated: usize,
    pub unknown: usize,
}

impl StatusSummary {
    pub fn from_records(records: &[PackageRecord]) -> Self {
        records
            .iter()
            .fold(Self::default(), |mut summary, record| {
                match record.status() {
                    PortStatus::Latest => summary.latest += 1,
                    PortStatus::Outdated => summary.outdated += 1,
                    PortStatus::Unknown => summary.unknown += 1,
                }
                summary
            })
    }
}
