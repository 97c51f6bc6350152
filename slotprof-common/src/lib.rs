//! # Shared Data Structures (engine ↔ embedders)
//!
//! Defines the small, dependency-free pieces shared between the aggregation
//! engine and whatever embeds it (a language runtime, an allocator hook, a
//! test harness). Everything here is `no_std` so an allocator-side probe can
//! link it without pulling in the rest of the engine.
//!
//! ## Key Types
//!
//! - [`FrameId`] - Opaque identity of one captured call frame
//! - [`pattern::Pattern`] - Compiled wildcard filter for frame names
//!
//! ## Tunables
//!
//! The defaults below seed the process-wide tunables. Changing a tunable only
//! affects Logs created afterwards; a live Log keeps the capacity and depth it
//! was built with.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod pattern;

// ============================================================================
// Tunable Defaults
// ============================================================================

/// Default bound on captured frames per sample.
///
/// Frames beyond this depth are not recorded and do not take part in
/// equality or hashing.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 16;

/// Default number of slots (unique call stacks) a single Log can hold.
///
/// Once every slot is used, the slot with the smallest count is evicted and
/// folded into the "others" bucket.
pub const DEFAULT_SLOT_HEAP_SIZE: usize = 10_000;

/// Sampling interval used when neither the CLI nor a config file sets one.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 10;

// ============================================================================
// Hash Index Sizing
// ============================================================================

/// Lower bound used when sizing the hash index for small slot heaps.
pub const MIN_HASH_BUCKETS: usize = 256;

/// Average number of slots sharing one hash bucket at full capacity.
pub const SLOTS_PER_BUCKET: usize = 10;

/// Number of hash buckets for a slot heap of `capacity` slots.
///
/// ```
/// use slotprof_common::bucket_count;
///
/// assert_eq!(bucket_count(2), 25);
/// assert_eq!(bucket_count(10_000), 1_000);
/// ```
#[must_use]
pub const fn bucket_count(capacity: usize) -> usize {
    let base = if capacity > MIN_HASH_BUCKETS { capacity } else { MIN_HASH_BUCKETS };
    base / SLOTS_PER_BUCKET
}

// ============================================================================
// Frame Identity
// ============================================================================

/// Opaque identity of a call frame.
///
/// Two frames are the same frame when their ids are equal; the engine never
/// looks at what an id refers to. Embedders hand out ids (for example by
/// interning function names) and resolve them back when reporting.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FrameId(pub u64);

impl core::fmt::Display for FrameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
