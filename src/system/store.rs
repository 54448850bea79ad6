use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::snapshot::SystemSnapshot;

/// Holds the most recently published snapshot. Publishing swaps a whole
/// `Arc`, so a reader gets either the old or the new snapshot, never a mix.
#[derive(Default)]
pub struct SnapshotStore {
    latest: ArcSwapOption<SystemSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot. Only the sampling task calls this.
    pub fn publish(&self, snapshot: SystemSnapshot) {
        self.latest.store(Some(Arc::new(snapshot)));
    }

    /// `None` until the first publish.
    pub fn read(&self) -> Option<Arc<SystemSnapshot>> {
        self.latest.load_full()
    }
}
