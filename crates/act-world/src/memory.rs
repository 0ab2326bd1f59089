//! Per-agent memory of storage contents.
//!
//! An agent remembers what it last saw in each storage for `expiry_ticks`.
//! Behaviors consult it to avoid walking across the map to a pantry they
//! already know is empty.

use act_core::{ItemId, Tick};
use rustc_hash::FxHashMap;

use crate::{Inventory, StorageId};

#[derive(Clone, Debug)]
struct Observation {
    contents: Inventory,
    seen_at:  Tick,
}

#[derive(Clone, Debug)]
pub struct StorageMemory {
    entries:      FxHashMap<StorageId, Observation>,
    expiry_ticks: u64,
}

impl StorageMemory {
    pub fn new(expiry_ticks: u64) -> Self {
        Self { entries: FxHashMap::default(), expiry_ticks }
    }

    /// Record (or refresh) what `storage` holds at `now`.
    pub fn observe_storage(&mut self, storage: StorageId, contents: &Inventory, now: Tick) {
        self.entries.insert(storage, Observation { contents: contents.clone(), seen_at: now });
    }

    /// Remembered contents, or `None` if never seen or the memory expired.
    pub fn recall_storage_contents(&self, storage: StorageId, now: Tick) -> Option<&Inventory> {
        self.entries
            .get(&storage)
            .filter(|o| now.since(o.seen_at) < self.expiry_ticks)
            .map(|o| &o.contents)
    }

    /// Drop a storage the agent learned no longer exists.
    pub fn forget(&mut self, storage: StorageId) {
        self.entries.remove(&storage);
    }

    /// Drop expired observations.  Called once per tick by the owner.
    pub fn forget_expired(&mut self, now: Tick) {
        let expiry = self.expiry_ticks;
        self.entries.retain(|_, o| now.since(o.seen_at) < expiry);
    }

    /// Unexpired storages remembered to hold at least one `item`.
    pub fn known_sources(&self, item: ItemId, now: Tick) -> Vec<StorageId> {
        let mut found: Vec<StorageId> = self
            .entries
            .iter()
            .filter(|(_, o)| now.since(o.seen_at) < self.expiry_ticks && o.contents.count(item) > 0)
            .map(|(&h, _)| h)
            .collect();
        // Hash order depends on insertion history.
        found.sort();
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
