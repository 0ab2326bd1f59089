//! Generational handles.
//!
//! A `Handle<T>` is an `(index, generation)` pair pointing into an arena of
//! `T`.  When the slot is freed its generation is bumped, so every handle
//! issued before the removal stops resolving.  Behaviors keep handles to
//! rooms, facilities and storages across many ticks; validating them against
//! the live arena at the start of each poll turns "the building was torn
//! down" into a typed lookup failure.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed generational reference into an arena of `T`.
///
/// `T` is only a marker; the handle holds no `T` and is `Copy` regardless
/// of what `T` is.
pub struct Handle<T> {
    index:      u32,
    generation: u32,
    _marker:    PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Build a handle from raw parts.  Arenas are the only expected caller.
    #[inline]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation, _marker: PhantomData }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

// Manual impls: derives would put bounds on `T`.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
