//! Item counts with a shared capacity.

use std::collections::BTreeMap;

use act_core::ItemId;

use crate::{WorldError, WorldResult};

/// Multiset of items bounded by a total unit capacity.
///
/// `BTreeMap` keeps iteration order stable, which keeps runs deterministic
/// when behaviors pick "the first item that matches".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items:    BTreeMap<ItemId, u32>,
    capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self { items: BTreeMap::new(), capacity }
    }

    /// Builder-style initial stock.  Ignores capacity so fixtures can
    /// overfill deliberately.
    pub fn with(mut self, item: ItemId, qty: u32) -> Self {
        if qty > 0 {
            *self.items.entry(item).or_default() += qty;
        }
        self
    }

    #[inline]
    pub fn count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.items.values().sum()
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.items.iter().map(|(&k, &v)| (k, v))
    }

    /// Add `qty` units.  All-or-nothing.
    pub fn add(&mut self, item: ItemId, qty: u32) -> WorldResult<()> {
        let free = self.free_space();
        if qty > free {
            return Err(WorldError::ContainerFull { free, wanted: qty });
        }
        if qty > 0 {
            *self.items.entry(item).or_default() += qty;
        }
        Ok(())
    }

    /// Remove `qty` units.  All-or-nothing.
    pub fn take(&mut self, item: ItemId, qty: u32) -> WorldResult<()> {
        let have = self.count(item);
        if have < qty {
            return Err(WorldError::InsufficientItems { item, wanted: qty, have });
        }
        if have == qty {
            self.items.remove(&item);
        } else {
            self.items.insert(item, have - qty);
        }
        Ok(())
    }

    /// `true` if every `(item, qty)` requirement is met.
    pub fn has_all(&self, wanted: &[(ItemId, u32)]) -> bool {
        wanted.iter().all(|&(item, qty)| self.count(item) >= qty)
    }
}
