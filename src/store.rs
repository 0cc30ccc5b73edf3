// src/store.rs
//
// Latest-snapshot holder shared between the scheduler (writer) and the API
// layer (readers). Snapshots live behind `Arc`, so `put` swaps a pointer under
// the write lock and readers clone a handle out under the read lock. A reader
// always sees one complete snapshot, never a partially replaced one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::scrape::types::{Market, Snapshot, Source};

type UnitKey = (Source, Option<Market>);

#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<HashMap<UnitKey, Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for the unit, or `None` before its first successful
    /// scrape.
    pub fn get(&self, source: Source, market: Option<Market>) -> Option<Arc<Snapshot>> {
        let map = self.inner.read().expect("snapshot store lock poisoned");
        map.get(&(source, market)).cloned()
    }

    /// Replace the unit's snapshot wholesale. Returns the stored handle.
    pub fn put(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let key = (snapshot.source, snapshot.market);
        let snap = Arc::new(snapshot);
        let mut map = self.inner.write().expect("snapshot store lock poisoned");
        map.insert(key, snap.clone());
        snap
    }

    /// Whether at least one unit of the source has a snapshot.
    pub fn is_ready(&self, source: Source) -> bool {
        let map = self.inner.read().expect("snapshot store lock poisoned");
        map.keys().any(|(s, _)| *s == source)
    }
}
