//! Pooled allocation for index entries
//!
//! Every rebuild cycle churns through one [`IndexedObject`] per active
//! simulation object. The pool keeps that storage alive across cycles:
//! entries are acquired during a rebuild, released wholesale on the next
//! [`ObjectPool::release_all`], and the backing allocation is retained so
//! steady-state rebuilds do not touch the heap at all.
//!
//! The pool is owned by the [`RegionIndex`](super::RegionIndex) it is
//! injected into. It is never global state, and entry handles are only
//! meaningful within the rebuild cycle that produced them.

use super::defaults;
use crate::types::{Aabb, ObjectId, Vec2};

/// Handle to a pooled index entry, valid for the current rebuild cycle only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryId(u32);

impl EntryId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A lightweight record pairing a simulated object's identity with the
/// position and bounding box it had at the last rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedObject {
    /// Identity of the simulated object (non-owning; consumers re-check
    /// liveness against the simulation before acting on it)
    pub id: ObjectId,
    /// World-space position at rebuild time
    pub position: Vec2,
    /// World-space bounding box at rebuild time
    pub aabb: Aabb,
}

/// Recycling allocator for [`IndexedObject`] entries.
///
/// Construct one with [`ObjectPool::prewarmed`] and hand it to
/// [`RegionIndex::new`](super::RegionIndex::new); the index owns it for the
/// rest of its life.
#[derive(Debug)]
pub struct ObjectPool {
    entries: Vec<IndexedObject>,
}

impl ObjectPool {
    /// Creates a pool with storage for `capacity` entries pre-allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Creates a pool pre-warmed to the default size
    /// ([`defaults::POOL_PREWARM`]).
    pub fn prewarmed() -> Self {
        Self::with_capacity(defaults::POOL_PREWARM)
    }

    /// Acquires an entry for the current rebuild cycle.
    pub(crate) fn acquire(&mut self, id: ObjectId, position: Vec2, aabb: Aabb) -> EntryId {
        let entry = EntryId(self.entries.len() as u32);
        self.entries.push(IndexedObject { id, position, aabb });
        entry
    }

    /// Returns every entry to the pool. Backing storage is retained, so the
    /// next cycle's acquisitions reuse it without reallocating.
    pub(crate) fn release_all(&mut self) {
        self.entries.clear();
    }

    /// Resolves an entry handle issued by [`ObjectPool::acquire`] this cycle.
    pub(crate) fn get(&self, entry: EntryId) -> &IndexedObject {
        &self.entries[entry.index()]
    }

    /// Number of entries in use this cycle.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entries are in use this cycle.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries the pool can hold before growing.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}
