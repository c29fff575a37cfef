//! Published reconciliation state
//!
//! The scheduler is the only writer. Readers get a [`StatusView`] and only
//! ever see whole snapshots: each publication swaps one `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::watch;

use crate::inventory::types::PackageRecord;
use crate::version::checker::StatusSummary;

/// Result of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Records in inventory order, unique by name
    pub records: Vec<PackageRecord>,
    /// When the last full check completed; `None` before the first one
    pub checked_at: Option<DateTime<Local>>,
}

impl ReconciliationResult {
    /// Result of a completed full check
    pub fn checked_now(records: Vec<PackageRecord>) -> Self {
        Self {
            records,
            checked_at: Some(Local::now()),
        }
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_records(&self.records)
    }
}

/// Write side of the published state
pub struct StatusBoard {
    result: watch::Sender<Arc<ReconciliationResult>>,
    loading: watch::Sender<bool>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (result, _) = watch::channel(Arc::new(ReconciliationResult::default()));
        let (loading, _) = watch::channel(false);
        Self { result, loading }
    }

    /// Replace the published result
    pub fn publish(&self, result: ReconciliationResult) -> Arc<ReconciliationResult> {
        let result = Arc::new(result);
        self.result.send_replace(result.clone());
        result
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }

    pub fn current(&self) -> Arc<ReconciliationResult> {
        self.result.borrow().clone()
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            result: self.result.subscribe(),
            loading: self.loading.subscribe(),
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the published state
#[derive(Clone)]
pub struct StatusView {
    result: watch::Receiver<Arc<ReconciliationResult>>,
    loading: watch::Receiver<bool>,
}

impl StatusView {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<ReconciliationResult> {
        self.result.borrow().clone()
    }

    /// Published records in inventory order
    pub fn ports(&self) -> Vec<PackageRecord> {
        self.result.borrow().records.clone()
    }

    /// Whether a run is in progress
    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn last_checked(&self) -> Option<DateTime<Local>> {
        self.result.borrow().checked_at
    }

    /// Wait until the snapshot or the loading flag changes
    ///
    /// Returns `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            changed = self.result.changed() => changed.is_ok(),
            changed = self.loading.changed() => changed.is_ok(),
        }
    }

    /// Mark the current values as seen
    pub fn mark_seen(&mut self) {
        self.result.borrow_and_update();
        self.loading.borrow_and_update();
    }
}
