//! Allocation profiler controller.
//!
//! Unlike the sample profiler there is no trigger and no mask. Allocation
//! events are delivered by the host on the thread that owns this
//! controller, and `&mut self` on every mutating call keeps an event from
//! interleaving with `reset` or a filter swap.

use std::sync::Arc;

use log::info;

use crate::backtrace::{Backtrace, BacktraceSource};
use crate::config::Tunables;
use crate::domain::{ProfilerError, ProfilerKind};
use crate::filter::Pattern;
use crate::profile_log::{Log, LogSnapshot};

/// Stopped/Running state machine that records one sample per allocation.
pub struct MemoryProfiler {
    log: Option<Log>,
    filter: Option<Arc<Pattern>>,
    tunables: Arc<Tunables>,
    running: bool,
}

impl MemoryProfiler {
    #[must_use]
    pub fn new(tunables: Arc<Tunables>) -> Self {
        Self { log: None, filter: None, tunables, running: false }
    }

    /// Start accepting allocation events.
    ///
    /// # Errors
    /// - [`ProfilerError::AlreadyRunning`] if already running
    /// - [`ProfilerError::ZeroCapacity`] / [`ProfilerError::ZeroStackDepth`]
    ///   if a new Log would be empty
    pub fn start(&mut self) -> Result<(), ProfilerError> {
        if self.running {
            return Err(ProfilerError::AlreadyRunning(ProfilerKind::Memory));
        }
        if self.log.is_none() {
            self.log = Some(Log::from_tunables(ProfilerKind::Memory, &self.tunables)?);
        }
        self.running = true;
        info!("memory profiler started");
        Ok(())
    }

    /// Stop accepting allocation events. Recorded data is kept.
    ///
    /// # Errors
    /// Returns [`ProfilerError::NotRunning`] if not running.
    pub fn stop(&mut self) -> Result<(), ProfilerError> {
        if !self.running {
            return Err(ProfilerError::NotRunning(ProfilerKind::Memory));
        }
        self.running = false;
        info!("memory profiler stopped");
        Ok(())
    }

    /// Clear the Log while running; drop it while stopped.
    pub fn reset(&mut self) {
        if self.running {
            if let Some(log) = self.log.as_mut() {
                log.clear();
            }
        } else {
            self.log = None;
        }
        info!("memory profiler reset");
    }

    /// Snapshot of the Log, or `None` if no Log exists.
    #[must_use]
    pub fn log(&self) -> Option<LogSnapshot> {
        self.log.as_ref().map(Log::snapshot)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Allocation hook: record `size` bytes against the current stack.
    ///
    /// Events arriving while stopped are ignored. Returns whether the
    /// allocation was recorded.
    pub fn on_allocation<S: BacktraceSource + ?Sized>(&mut self, source: &S, size: u64) -> bool {
        if !self.running {
            return false;
        }
        match self.log.as_mut() {
            Some(log) => log.record_sample(source, self.filter.as_deref(), size, 0),
            None => false,
        }
    }

    pub fn set_filter(&mut self, filter: Option<Arc<Pattern>>) {
        self.filter = filter;
    }

    pub fn trace_references(&self, visit: &mut dyn FnMut(&Backtrace)) {
        if let Some(log) = self.log.as_ref() {
            log.trace_references(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtrace::Frame;
    use crate::domain::FrameId;
    use crate::profile_log::{StackKey, StackRecord};

    fn stack(ids: &[u64]) -> Vec<Frame> {
        ids.iter().map(|&id| Frame::named(FrameId(id), format!("fn_{id}"))).collect()
    }

    fn profiler() -> MemoryProfiler {
        MemoryProfiler::new(Arc::new(Tunables::new(4, 8)))
    }

    #[test]
    fn test_allocations_count_bytes() {
        let mut profiler = profiler();
        profiler.start().unwrap();
        assert!(profiler.on_allocation(&stack(&[1, 2]), 64));
        assert!(profiler.on_allocation(&stack(&[1, 2]), 32));

        let snapshot = profiler.log().unwrap();
        assert_eq!(snapshot.kind, ProfilerKind::Memory);
        assert_eq!(
            snapshot.records,
            vec![StackRecord {
                key: StackKey::Frames(vec![FrameId(1), FrameId(2)]),
                count: 96,
                elapsed: 0
            }]
        );
    }

    #[test]
    fn test_events_after_stop_are_ignored() {
        let mut profiler = profiler();
        assert!(!profiler.on_allocation(&stack(&[1]), 8));

        profiler.start().unwrap();
        profiler.on_allocation(&stack(&[1]), 8);
        profiler.stop().unwrap();
        assert!(!profiler.on_allocation(&stack(&[1]), 8));
        assert_eq!(profiler.log().unwrap().total_count(), 8);
    }

    #[test]
    fn test_lifecycle_errors_leave_state() {
        let mut profiler = profiler();
        assert!(matches!(profiler.stop(), Err(ProfilerError::NotRunning(ProfilerKind::Memory))));
        profiler.start().unwrap();
        assert!(matches!(profiler.start(), Err(ProfilerError::AlreadyRunning(ProfilerKind::Memory))));
        assert!(profiler.is_running());
    }

    #[test]
    fn test_zero_capacity_fails_start() {
        let mut profiler = MemoryProfiler::new(Arc::new(Tunables::new(4, 0)));
        assert!(matches!(profiler.start(), Err(ProfilerError::ZeroCapacity)));
        assert!(!profiler.is_running());
        assert!(profiler.log().is_none());
    }

    #[test]
    fn test_reset_semantics() {
        let mut profiler = profiler();
        profiler.start().unwrap();
        profiler.on_allocation(&stack(&[1]), 8);
        profiler.reset();
        assert!(profiler.log().unwrap().records.is_empty());

        profiler.stop().unwrap();
        profiler.reset();
        assert!(profiler.log().is_none());
    }

    #[test]
    fn test_filter_applies() {
        let mut profiler = profiler();
        profiler.set_filter(Some(Arc::new(Pattern::parse("fn_2"))));
        profiler.start().unwrap();
        assert!(!profiler.on_allocation(&stack(&[1]), 8));
        assert!(profiler.on_allocation(&stack(&[1, 2]), 8));
        assert_eq!(profiler.log().unwrap().total_count(), 8);
    }
}
