//! The coordination agent's only cross-request mutable state: the result
//! of the most recent successful planning cycle. Readers take a cheap
//! `Arc` clone; writers replace the whole snapshot rather than mutating
//! its fields, so `export_beckn_catalog` never observes a half-updated
//! schedule.

use caco_core::types::{FlexOffer, ScheduledJob};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct PlanningSnapshot {
    pub scheduled_jobs: Vec<ScheduledJob>,
    pub flex_offers: Vec<FlexOffer>,
}

pub struct SnapshotCache {
    inner: RwLock<Arc<PlanningSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(PlanningSnapshot::default())),
        }
    }

    pub async fn current(&self) -> Arc<PlanningSnapshot> {
        self.inner.read().await.clone()
    }

    /// Replace the cached snapshot atomically. Never mutates the previous
    /// snapshot in place.
    pub async fn replace(&self, snapshot: PlanningSnapshot) {
        let mut guard = self.inner.write().await;
        *guard = Arc::new(snapshot);
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let cache = SnapshotCache::new();
        let snapshot = cache.current().await;
        assert!(snapshot.scheduled_jobs.is_empty());
        assert!(snapshot.flex_offers.is_empty());
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_snapshot() {
        let cache = SnapshotCache::new();
        let before = cache.current().await;

        cache
            .replace(PlanningSnapshot {
                scheduled_jobs: Vec::new(),
                flex_offers: vec![],
            })
            .await;

        let after = cache.current().await;
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
