//! Hash index over the slot heap.
//!
//! Each bucket holds the head of an intrusive chain of used slots, linked
//! through the slots' own `prev`/`next` fields.

use super::heap::SlotIndex;

#[derive(Debug)]
pub(crate) struct SlotTable {
    buckets: Box<[Option<SlotIndex>]>,
}

impl SlotTable {
    pub(crate) fn new(bucket_count: usize) -> Self {
        Self { buckets: vec![None; bucket_count.max(1)].into_boxed_slice() }
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.fill(None);
    }

    #[allow(clippy::cast_possible_truncation)] // modulo keeps it below the bucket count
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn head(&self, bucket: usize) -> Option<SlotIndex> {
        self.buckets[bucket]
    }

    pub(crate) fn set_head(&mut self, bucket: usize, head: Option<SlotIndex>) {
        self.buckets[bucket] = head;
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }
}
