//! The two controllers plus the state they share: tunables and the filter.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::backtrace::Backtrace;
use crate::config::Tunables;
use crate::domain::ProfilerError;
use crate::filter::{pattern_from_value, Pattern};
use crate::profiling::memory::MemoryProfiler;
use crate::profiling::sample::{SampleProfiler, SharedSource};
use crate::profiling::trigger::Trigger;

/// Owns the sample and memory controllers of one embedding host.
pub struct Profiler {
    tunables: Arc<Tunables>,
    filter: Option<Arc<Pattern>>,
    sample: SampleProfiler,
    memory: MemoryProfiler,
}

impl Profiler {
    /// Create a profiler with default tunables.
    #[must_use]
    pub fn new(trigger: impl Trigger + 'static, source: SharedSource) -> Self {
        Self::with_tunables(trigger, source, Arc::new(Tunables::default()))
    }

    #[must_use]
    pub fn with_tunables(trigger: impl Trigger + 'static, source: SharedSource, tunables: Arc<Tunables>) -> Self {
        Self {
            sample: SampleProfiler::new(trigger, source, Arc::clone(&tunables)),
            memory: MemoryProfiler::new(Arc::clone(&tunables)),
            filter: None,
            tunables,
        }
    }

    /// Sizing knobs read by every new Log.
    #[must_use]
    pub fn tunables(&self) -> &Arc<Tunables> {
        &self.tunables
    }

    #[must_use]
    pub fn sample(&self) -> &SampleProfiler {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut SampleProfiler {
        &mut self.sample
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryProfiler {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryProfiler {
        &mut self.memory
    }

    /// Replace the active filter; `None` clears it.
    pub fn set_filter_pattern(&mut self, pattern: Option<&str>) {
        self.install_filter(pattern.map(Pattern::parse));
    }

    /// Replace the active filter from a host value.
    ///
    /// # Errors
    /// Returns [`ProfilerError::InvalidFilterType`] unless `value` is a
    /// string or null; the active filter is unchanged in that case.
    pub fn set_filter_value(&mut self, value: &Value) -> Result<(), ProfilerError> {
        let pattern = pattern_from_value(value)?;
        self.install_filter(pattern);
        Ok(())
    }

    #[must_use]
    pub fn filter_pattern(&self) -> Option<&Pattern> {
        self.filter.as_deref()
    }

    /// Visit every backtrace owned by either Log: sample first, then memory.
    pub fn trace_references(&self, visit: &mut dyn FnMut(&Backtrace)) {
        self.sample.trace_references(visit);
        self.memory.trace_references(visit);
    }

    fn install_filter(&mut self, pattern: Option<Pattern>) {
        debug!("filter set to {pattern:?}");
        let pattern = pattern.map(Arc::new);
        self.sample.set_filter(pattern.clone());
        self.memory.set_filter(pattern.clone());
        self.filter = pattern;
    }
}
