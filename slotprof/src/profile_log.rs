//! A profiler's accumulated data: one slot store plus the "others" bucket.
//!
//! ## Data Flow
//!
//! ```text
//! trigger (tick / allocation)
//!     │
//!     ├──► filter::capture_matching()   ← one walk: capture into scratch + filter
//!     │                                   (rejected samples change no stats)
//!     │
//!     └──► SlotStore::record_delta()    ← evictions fold into "others"
//!
//! Log::snapshot() ──► LogSnapshot (owned, immutable)
//! ```

use serde::{Deserialize, Serialize};

use crate::backtrace::{Backtrace, BacktraceSource};
use crate::config::Tunables;
use crate::domain::{FrameId, ProfilerError, ProfilerKind, Timestamp};
use crate::filter::{capture_matching, Pattern};
use crate::store::{SlotStats, SlotStore};

// =============================================================================
// SNAPSHOT (OUTPUT TYPES)
// =============================================================================

/// What a snapshot record aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKey {
    /// Reserved marker for the mass of every evicted slot.
    Others,
    /// One unique call stack, innermost frame first.
    Frames(Vec<FrameId>),
}

/// One aggregated record in a [`LogSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub key: StackKey,
    pub count: u64,
    pub elapsed: u64,
}

/// Immutable copy of a Log's contents at one instant.
///
/// When the "others" bucket is non-zero its record comes first; the slot
/// records follow in the Log's arena order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub kind: ProfilerKind,
    pub created_at: Timestamp,
    pub taken_at: Timestamp,
    pub records: Vec<StackRecord>,
}

impl LogSnapshot {
    /// The "others" record, if any slot has been evicted since the last clear.
    #[must_use]
    pub fn others(&self) -> Option<&StackRecord> {
        self.records.iter().find(|record| record.key == StackKey::Others)
    }

    /// Records for real call stacks, without "others".
    pub fn stacks(&self) -> impl Iterator<Item = (&[FrameId], &StackRecord)> {
        self.records.iter().filter_map(|record| match &record.key {
            StackKey::Frames(frames) => Some((frames.as_slice(), record)),
            StackKey::Others => None,
        })
    }

    /// Sum of `count` over every record, "others" included.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|record| record.count).sum()
    }

    /// Sum of `elapsed` over every record, "others" included.
    #[must_use]
    pub fn total_elapsed(&self) -> u64 {
        self.records.iter().map(|record| record.elapsed).sum()
    }
}

// =============================================================================
// LOG
// =============================================================================

/// One profiler's aggregated samples since creation or the last clear.
#[derive(Debug)]
pub struct Log {
    kind: ProfilerKind,
    created_at: Timestamp,
    /// Capture buffer reused for every sample.
    scratch: Backtrace,
    store: SlotStore,
    others: SlotStats,
}

impl Log {
    /// Create a Log with `capacity` slots of up to `max_stack_depth` frames.
    ///
    /// # Errors
    /// Returns [`ProfilerError::ZeroCapacity`] or
    /// [`ProfilerError::ZeroStackDepth`] for a zero-sized configuration.
    pub fn new(kind: ProfilerKind, capacity: usize, max_stack_depth: usize) -> Result<Self, ProfilerError> {
        let store = SlotStore::new(capacity, max_stack_depth)?;
        log::debug!("created {kind} log ({capacity} slots, depth {max_stack_depth})");
        Ok(Self {
            kind,
            created_at: Timestamp::now(),
            scratch: Backtrace::new(max_stack_depth),
            store,
            others: SlotStats::default(),
        })
    }

    /// Create a Log sized from the current tunables.
    ///
    /// # Errors
    /// Same as [`Log::new`].
    pub fn from_tunables(kind: ProfilerKind, tunables: &Tunables) -> Result<Self, ProfilerError> {
        Self::new(kind, tunables.slot_heap_size(), tunables.max_stack_depth())
    }

    #[must_use]
    pub fn kind(&self) -> ProfilerKind {
        self.kind
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    #[must_use]
    pub fn max_stack_depth(&self) -> usize {
        self.scratch.depth()
    }

    /// Number of unique call stacks currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Stats folded in from evicted slots.
    #[must_use]
    pub fn others(&self) -> SlotStats {
        self.others
    }

    /// Stats of every slot plus "others".
    #[must_use]
    pub fn total(&self) -> SlotStats {
        self.store.iter().fold(self.others, |mut total, (_, stats)| {
            total.add(stats.count, stats.elapsed);
            total
        })
    }

    /// Stats recorded for `backtrace`, if it currently has a slot.
    #[must_use]
    pub fn get(&self, backtrace: &Backtrace) -> Option<SlotStats> {
        self.store.get(backtrace)
    }

    /// Capture the current stack from `source` and record it.
    ///
    /// Nothing changes if `filter` rejects the stack or if no frame was
    /// captured. Returns whether the sample was recorded.
    pub fn record_sample<S: BacktraceSource + ?Sized>(
        &mut self,
        source: &S,
        filter: Option<&Pattern>,
        count: u64,
        elapsed: u64,
    ) -> bool {
        if !capture_matching(filter, source, &mut self.scratch) || self.scratch.is_empty() {
            return false;
        }
        if let Some(evicted) = self.store.record_delta(&self.scratch, count, elapsed) {
            self.others.add(evicted.count, evicted.elapsed);
        }
        true
    }

    /// Record an already captured backtrace. Empty backtraces are ignored.
    pub fn record_backtrace(&mut self, backtrace: &Backtrace, count: u64, elapsed: u64) -> bool {
        if backtrace.is_empty() {
            return false;
        }
        self.scratch.copy_from(backtrace);
        if let Some(evicted) = self.store.record_delta(&self.scratch, count, elapsed) {
            self.others.add(evicted.count, evicted.elapsed);
        }
        true
    }

    /// Drop every sample and zero "others", keeping all storage.
    pub fn clear(&mut self) {
        self.store.clear();
        self.scratch.clear();
        self.others = SlotStats::default();
        log::debug!("cleared {} log", self.kind);
    }

    /// Copy the Log's contents into an owned snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LogSnapshot {
        let mut records = Vec::with_capacity(self.store.len() + 1);
        if !self.others.is_zero() {
            records.push(StackRecord {
                key: StackKey::Others,
                count: self.others.count,
                elapsed: self.others.elapsed,
            });
        }
        records.extend(self.store.iter().map(|(backtrace, stats)| StackRecord {
            key: StackKey::Frames(backtrace.to_vec()),
            count: stats.count,
            elapsed: stats.elapsed,
        }));

        LogSnapshot { kind: self.kind, created_at: self.created_at, taken_at: Timestamp::now(), records }
    }

    /// Visit every backtrace this Log owns: the scratch buffer, then each
    /// used slot's copy.
    pub fn trace_references(&self, visit: &mut dyn FnMut(&Backtrace)) {
        visit(&self.scratch);
        for (backtrace, _) in self.store.iter() {
            visit(backtrace);
        }
    }
}
