//! Bounded-capacity aggregation store keyed by backtrace.
//!
//! # Architecture
//!
//! - **`SlotHeap`** - fixed arena of slots plus an intrusive free list
//! - **`SlotTable`** - `max(256, capacity) / 10` buckets of intrusive chains
//! - **`SlotStore`** - ties both together behind [`SlotStore::record_delta`]
//!
//! ## Eviction
//!
//! When every slot is used and a new backtrace arrives, the used slot with
//! the smallest `count` is evicted. The scan walks the whole arena and the
//! first minimum in index order wins. Its stats are handed back to the
//! caller, which folds them into the "others" bucket.
//!
//! # Performance
//!
//! - `record_delta()`: O(chain length) for a hit, O(capacity) when evicting
//! - Memory: fixed at construction, nothing is allocated per record

mod heap;
mod table;

use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault};

use log::trace;
use slotprof_common::bucket_count;

use crate::backtrace::Backtrace;
use crate::domain::ProfilerError;
use heap::{SlotHeap, SlotIndex};
use table::SlotTable;

/// Aggregated stats of one slot (or of the "others" bucket).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    /// Number of occurrences (or bytes, for memory Logs).
    pub count: u64,
    /// Accumulated weight (milliseconds for sample Logs).
    pub elapsed: u64,
}

impl SlotStats {
    pub fn add(&mut self, count: u64, elapsed: u64) {
        self.count = self.count.saturating_add(count);
        self.elapsed = self.elapsed.saturating_add(elapsed);
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.elapsed == 0
    }
}

/// Fixed-capacity map from [`Backtrace`] to [`SlotStats`].
#[derive(Debug)]
pub struct SlotStore {
    heap: SlotHeap,
    table: SlotTable,
    hasher: BuildHasherDefault<DefaultHasher>,
}

impl SlotStore {
    /// Allocate a store of `capacity` slots, each holding up to
    /// `max_stack_depth` frames.
    ///
    /// # Errors
    /// Returns [`ProfilerError::ZeroCapacity`] or
    /// [`ProfilerError::ZeroStackDepth`] for a zero-sized configuration.
    pub fn new(capacity: usize, max_stack_depth: usize) -> Result<Self, ProfilerError> {
        if capacity == 0 {
            return Err(ProfilerError::ZeroCapacity);
        }
        if max_stack_depth == 0 {
            return Err(ProfilerError::ZeroStackDepth);
        }
        Ok(Self {
            heap: SlotHeap::new(capacity, max_stack_depth),
            table: SlotTable::new(bucket_count(capacity)),
            hasher: BuildHasherDefault::default(),
        })
    }

    /// Add `count`/`elapsed` to the slot for `key`, creating it if needed.
    ///
    /// The key is copied into the slot's own storage, so the caller may reuse
    /// its buffer as soon as this returns. Returns the stats of the slot that
    /// had to be evicted to make room, if any.
    ///
    /// # Panics
    /// Panics if the free list is empty while no slot is in use, which means
    /// the store's internal bookkeeping is corrupt.
    pub fn record_delta(&mut self, key: &Backtrace, count: u64, elapsed: u64) -> Option<SlotStats> {
        let bucket = self.table.bucket_of(self.hasher.hash_one(key));

        if let Some(index) = self.find(bucket, key) {
            let slot = self.heap.slot_mut(index);
            slot.count = slot.count.saturating_add(count);
            slot.elapsed = slot.elapsed.saturating_add(elapsed);
            return None;
        }

        let (index, evicted) = self.allocate_or_evict();

        // Eviction may have shortened this very chain, so find the tail now
        let tail = self.chain_tail(bucket);
        let slot = self.heap.slot_mut(index);
        slot.backtrace.copy_from(key);
        slot.count = count;
        slot.elapsed = elapsed;
        slot.prev = tail;
        match tail {
            Some(tail) => self.heap.slot_mut(tail).next = Some(index),
            None => self.table.set_head(bucket, Some(index)),
        }

        evicted
    }

    /// Stats for `key`, if it has a slot.
    #[must_use]
    pub fn get(&self, key: &Backtrace) -> Option<SlotStats> {
        let bucket = self.table.bucket_of(self.hasher.hash_one(key));
        self.find(bucket, key).map(|index| {
            let slot = self.heap.slot(index);
            SlotStats { count: slot.count, elapsed: slot.elapsed }
        })
    }

    /// Return every slot to the free list and empty the index. Storage is
    /// kept for reuse.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.table.clear();
    }

    /// Number of used slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.used()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Used slots in arena order. The order only depends on the arena's
    /// contents, so it is stable between calls that do not mutate.
    pub fn iter(&self) -> impl Iterator<Item = (&Backtrace, SlotStats)> {
        self.heap
            .iter_used()
            .map(|(_, slot)| (&slot.backtrace, SlotStats { count: slot.count, elapsed: slot.elapsed }))
    }

    fn find(&self, bucket: usize, key: &Backtrace) -> Option<SlotIndex> {
        let mut cursor = self.table.head(bucket);
        while let Some(index) = cursor {
            let slot = self.heap.slot(index);
            if slot.backtrace == *key {
                return Some(index);
            }
            cursor = slot.next;
        }
        None
    }

    fn chain_tail(&self, bucket: usize) -> Option<SlotIndex> {
        let mut tail = self.table.head(bucket)?;
        while let Some(next) = self.heap.slot(tail).next {
            tail = next;
        }
        Some(tail)
    }

    fn allocate_or_evict(&mut self) -> (SlotIndex, Option<SlotStats>) {
        if let Some(index) = self.heap.allocate() {
            return (index, None);
        }
        let evicted = self.evict_min();
        let Some(index) = self.heap.allocate() else {
            panic!("evicting a slot did not return it to the free list");
        };
        (index, Some(evicted))
    }

    fn evict_min(&mut self) -> SlotStats {
        let Some(index) = self.heap.min_slot() else {
            panic!("slot store has no free slot and no used slot to evict");
        };
        let slot = self.heap.slot(index);
        let stats = SlotStats { count: slot.count, elapsed: slot.elapsed };
        trace!("evicting slot {index} (count={}, elapsed={})", stats.count, stats.elapsed);
        self.unlink(index);
        self.heap.free(index);
        stats
    }

    fn unlink(&mut self, index: SlotIndex) {
        let slot = self.heap.slot(index);
        let (prev, next) = (slot.prev, slot.next);
        let bucket = self.table.bucket_of(self.hasher.hash_one(&slot.backtrace));
        match prev {
            Some(prev) => self.heap.slot_mut(prev).next = next,
            None => self.table.set_head(bucket, next),
        }
        if let Some(next) = next {
            self.heap.slot_mut(next).prev = prev;
        }
    }

    /// Check the structural invariants, panicking on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        assert!(self.len() <= self.capacity());
        let mut reachable = HashSet::new();
        for bucket in 0..self.table.len() {
            let mut prev = None;
            let mut cursor = self.table.head(bucket);
            while let Some(index) = cursor {
                let slot = self.heap.slot(index);
                assert!(slot.used, "unused slot {index} reachable from bucket {bucket}");
                assert_eq!(slot.prev, prev, "broken back link at slot {index}");
                assert_eq!(self.table.bucket_of(self.hasher.hash_one(&slot.backtrace)), bucket);
                assert!(reachable.insert(index), "slot {index} reachable twice");
                prev = Some(index);
                cursor = slot.next;
            }
        }
        let used: HashSet<_> = self.heap.iter_used().map(|(index, _)| index).collect();
        assert_eq!(reachable, used);
    }
}
