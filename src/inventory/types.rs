//! Common types for inventory records

use indexmap::IndexMap;

/// One installed package, optionally annotated with the registry's latest version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// Package name, the identity key of the record
    pub name: String,
    /// Version token extracted from the local listing
    pub installed_version: String,
    /// Latest version published upstream, if known
    pub latest_version: Option<String>,
}

impl PackageRecord {
    /// Create a record as read from the local inventory (no upstream data yet)
    pub fn installed(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            latest_version: None,
        }
    }

    /// Return a new record carrying the given latest version
    pub fn with_latest(&self, latest_version: Option<String>) -> Self {
        Self {
            name: self.name.clone(),
            installed_version: self.installed_version.clone(),
            latest_version,
        }
    }
}

/// Collapse records sharing a name into one.
///
/// The last occurrence supplies the data, the first occurrence keeps its
/// position, so the order stays stable between runs.
pub fn collapse_duplicates(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut by_name: IndexMap<String, PackageRecord> = IndexMap::with_capacity(records.len());
    for record in records {
        by_name.insert(record.name.clone(), record);
    }
    by_name.into_values().collect()
}
