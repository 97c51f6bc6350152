//! Slot arena with an embedded free list.
//!
//! All slots, including each slot's backtrace storage, are allocated once
//! when the heap is built. Unused slots are threaded through their `next`
//! link; used slots reuse the same links for their hash chain.

use crate::backtrace::Backtrace;

/// Index of a slot in the heap.
pub(crate) type SlotIndex = usize;

/// One aggregated record for one unique backtrace.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) backtrace: Backtrace,
    pub(crate) count: u64,
    pub(crate) elapsed: u64,
    pub(crate) used: bool,
    pub(crate) prev: Option<SlotIndex>,
    pub(crate) next: Option<SlotIndex>,
}

#[derive(Debug)]
pub(crate) struct SlotHeap {
    slots: Vec<Slot>,
    free_list: Option<SlotIndex>,
    used: usize,
}

impl SlotHeap {
    pub(crate) fn new(capacity: usize, max_stack_depth: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                backtrace: Backtrace::new(max_stack_depth),
                count: 0,
                elapsed: 0,
                used: false,
                prev: None,
                next: None,
            })
            .collect();
        let mut heap = Self { slots, free_list: None, used: 0 };
        heap.clear();
        heap
    }

    /// Mark every slot unused and rebuild the free list in index order.
    pub(crate) fn clear(&mut self) {
        let len = self.slots.len();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.used = false;
            slot.count = 0;
            slot.elapsed = 0;
            slot.prev = None;
            slot.next = if index + 1 < len { Some(index + 1) } else { None };
        }
        self.free_list = if len > 0 { Some(0) } else { None };
        self.used = 0;
    }

    /// Pop a slot off the free list, zeroed and marked used.
    pub(crate) fn allocate(&mut self) -> Option<SlotIndex> {
        let index = self.free_list?;
        let slot = &mut self.slots[index];
        self.free_list = slot.next;
        slot.count = 0;
        slot.elapsed = 0;
        slot.used = true;
        slot.prev = None;
        slot.next = None;
        self.used += 1;
        Some(index)
    }

    /// Return a used slot to the free list. The caller unlinks it first.
    pub(crate) fn free(&mut self, index: SlotIndex) {
        let slot = &mut self.slots[index];
        debug_assert!(slot.used, "freeing slot {index} twice");
        slot.used = false;
        slot.prev = None;
        slot.next = self.free_list;
        self.free_list = Some(index);
        self.used -= 1;
    }

    /// The used slot with the smallest count; ties go to the lowest index.
    pub(crate) fn min_slot(&self) -> Option<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.used)
            .min_by_key(|(_, slot)| slot.count)
            .map(|(index, _)| index)
    }

    pub(crate) fn slot(&self, index: SlotIndex) -> &Slot {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: SlotIndex) -> &mut Slot {
        &mut self.slots[index]
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    /// Used slots in index order.
    pub(crate) fn iter_used(&self) -> impl Iterator<Item = (SlotIndex, &Slot)> {
        self.slots.iter().enumerate().filter(|(_, slot)| slot.used)
    }
}
