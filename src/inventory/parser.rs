//! Inventory parser
//!
//! Builds package records from two pieces of package manager output:
//! the free-form self-version text and the line-oriented installed listing.
//!
//! Listing format example (`port installed requested and active`):
//! ```text
//! The following ports are currently installed:
//!   curl @8.5.0_0+ssl (active)
//!   python313 @3.13.3_0 (active)
//! ```
//!
//! Parsing never fails; lines that don't fit are dropped.

use tracing::debug;

use crate::config::DEFAULT_SELF_PACKAGE_NAME;
use crate::inventory::pattern::VersionPattern;
use crate::inventory::types::PackageRecord;

/// Minimum number of space-separated fields for a listing line to be considered
const MIN_FIELDS: usize = 3;

/// Parser for package manager inventory output
pub struct InventoryParser {
    pattern: VersionPattern,
    /// Name used for the record describing the package manager itself
    self_name: String,
}

impl InventoryParser {
    pub fn new(self_name: impl Into<String>) -> Self {
        Self {
            pattern: VersionPattern::new(),
            self_name: self_name.into(),
        }
    }

    /// Parse both command outputs into records, in listing order
    ///
    /// The self-version record comes first when a version token is found.
    /// No de-duplication happens here.
    pub fn parse(&self, version_output: &str, installed_output: &str) -> Vec<PackageRecord> {
        let mut records = Vec::new();

        if let Some(version) = self.pattern.extract_version(version_output) {
            records.push(PackageRecord::installed(&self.self_name, version));
        }

        let mut dropped = 0usize;
        for line in split_lines(installed_output) {
            match self.parse_line(line) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        debug!(
            "Parsed {} inventory records, dropped {} lines",
            records.len(),
            dropped
        );

        records
    }

    fn parse_line(&self, line: &str) -> Option<PackageRecord> {
        let fields: Vec<&str> = line.split(' ').filter(|f| !f.is_empty()).collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let name = self.pattern.extract_name(fields[0])?;
        let version = self.pattern.extract_version(fields[1])?;

        Some(PackageRecord::installed(name, version))
    }
}

impl Default for InventoryParser {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_PACKAGE_NAME)
    }
}

/// Split on any newline character, skipping empty lines
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| {
        matches!(
            c,
            '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
        )
    })
    .filter(|line| !line.is_empty())
}
