//! Generational arena.
//!
//! Slots are reused after removal; each reuse bumps the slot's generation so
//! handles issued for the previous occupant no longer resolve.

use act_core::Handle;

use crate::{WorldError, WorldResult};

struct Slot<T> {
    generation: u32,
    value:      Option<T>,
}

/// Registry of `T` addressed by [`Handle<T>`].
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free:  Vec<u32>,
    len:   usize,
    /// Entity kind name used in `StaleHandle` errors ("facility", …).
    kind:  &'static str,
}

impl<T> Arena<T> {
    pub fn new(kind: &'static str) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), len: 0, kind }
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::from_raw(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        Handle::from_raw(index, 0)
    }

    /// Remove and return the value.  Every outstanding copy of `handle`
    /// becomes stale.
    pub fn remove(&mut self, handle: Handle<T>) -> WorldResult<T> {
        let kind = self.kind;
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation() && s.value.is_some())
            .ok_or_else(|| stale(kind, handle))?;
        let value = slot.value.take().ok_or_else(|| stale(kind, handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        Ok(value)
    }

    pub fn get(&self, handle: Handle<T>) -> WorldResult<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.value.as_ref())
            .ok_or_else(|| stale(self.kind, handle))
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> WorldResult<&mut T> {
        let kind = self.kind;
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.value.as_mut())
            .ok_or_else(|| stale(kind, handle))
    }

    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live `(handle, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value
                .as_ref()
                .map(|v| (Handle::from_raw(i as u32, s.generation), v))
        })
    }
}

fn stale<T>(kind: &'static str, handle: Handle<T>) -> WorldError {
    WorldError::StaleHandle { kind, handle: handle.to_string() }
}
