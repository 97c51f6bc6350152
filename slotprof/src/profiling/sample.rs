//! Time-sampling profiler controller.
//!
//! ## Masking
//!
//! ```text
//!   foreground                          trigger thread
//!   ──────────                          ──────────────
//!   reset() / log() / set_filter()      tick()
//!        │                                 │
//!        └──► lock(shared) ◄───────────────┘
//!              │
//!              └── SampleState { log, interval_ms, filter }
//! ```
//!
//! The shared-state mutex is the mask. A tick that arrives while a
//! foreground call holds the guard waits until the guard drops, so it can
//! never see a Log halfway through `clear` or `snapshot`. The guard is
//! released on every exit path, including early returns and panics.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::info;

use crate::backtrace::{Backtrace, BacktraceSource};
use crate::config::Tunables;
use crate::domain::{ProfilerError, ProfilerKind};
use crate::filter::Pattern;
use crate::profile_log::{Log, LogSnapshot};
use crate::profiling::trigger::{TickFn, Trigger};

/// Backtrace source shared between the foreground and the trigger thread.
pub type SharedSource = Arc<dyn BacktraceSource + Send + Sync>;

#[derive(Default)]
struct SampleState {
    log: Option<Log>,
    /// Interval of the last successful start, 0 before the first.
    interval_ms: u64,
    filter: Option<Arc<Pattern>>,
}

/// Stopped/Running state machine that records one sample per trigger tick.
pub struct SampleProfiler {
    shared: Arc<Mutex<SampleState>>,
    trigger: Box<dyn Trigger>,
    source: SharedSource,
    tunables: Arc<Tunables>,
    running: bool,
}

impl SampleProfiler {
    #[must_use]
    pub fn new(trigger: impl Trigger + 'static, source: SharedSource, tunables: Arc<Tunables>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SampleState::default())),
            trigger: Box::new(trigger),
            source,
            tunables,
            running: false,
        }
    }

    /// Start sampling every `interval_ms` milliseconds.
    ///
    /// Creates the Log from the current tunables if there is none. On any
    /// failure the profiler is left exactly as it was.
    ///
    /// # Errors
    /// - [`ProfilerError::AlreadyRunning`] if already running
    /// - [`ProfilerError::InvalidInterval`] for a zero interval
    /// - [`ProfilerError::ZeroCapacity`] / [`ProfilerError::ZeroStackDepth`]
    ///   if a new Log would be empty
    /// - [`ProfilerError::TriggerInstallFailed`] if ticks cannot be scheduled
    pub fn start(&mut self, interval_ms: u64) -> Result<(), ProfilerError> {
        if self.running {
            return Err(ProfilerError::AlreadyRunning(ProfilerKind::Sample));
        }
        if interval_ms == 0 {
            return Err(ProfilerError::InvalidInterval(interval_ms));
        }

        let (created, previous_interval) = {
            let mut state = lock(&self.shared);
            let created = if state.log.is_none() {
                state.log = Some(Log::from_tunables(ProfilerKind::Sample, &self.tunables)?);
                true
            } else {
                false
            };
            let previous = std::mem::replace(&mut state.interval_ms, interval_ms);
            (created, previous)
        };

        let tick = make_tick(Arc::clone(&self.shared), Arc::clone(&self.source));
        if let Err(e) = self.trigger.install(Duration::from_millis(interval_ms), tick) {
            let mut state = lock(&self.shared);
            state.interval_ms = previous_interval;
            if created {
                state.log = None;
            }
            return Err(e);
        }

        self.running = true;
        info!("sample profiler started ({interval_ms}ms interval)");
        Ok(())
    }

    /// Stop sampling. Recorded data is kept.
    ///
    /// # Errors
    /// Returns [`ProfilerError::NotRunning`] if not running.
    pub fn stop(&mut self) -> Result<(), ProfilerError> {
        if !self.running {
            return Err(ProfilerError::NotRunning(ProfilerKind::Sample));
        }
        self.trigger.cancel();
        self.running = false;
        info!("sample profiler stopped");
        Ok(())
    }

    /// Discard recorded data.
    ///
    /// While running the Log is cleared in place under the mask. While
    /// stopped the Log is dropped, so the next start sizes a fresh one from
    /// the tunables current at that time.
    pub fn reset(&mut self) {
        let mut state = self.mask();
        if self.running {
            if let Some(log) = state.log.as_mut() {
                log.clear();
            }
        } else {
            state.log = None;
        }
        drop(state);
        info!("sample profiler reset");
    }

    /// Snapshot of the Log, or `None` if no Log exists.
    #[must_use]
    pub fn log(&self) -> Option<LogSnapshot> {
        self.mask().log.as_ref().map(Log::snapshot)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Interval of the last successful start.
    #[must_use]
    pub fn interval_ms(&self) -> Option<u64> {
        Some(self.mask().interval_ms).filter(|&ms| ms > 0)
    }

    /// Replace the filter under the mask.
    pub fn set_filter(&self, filter: Option<Arc<Pattern>>) {
        self.mask().filter = filter;
    }

    /// Visit every backtrace the Log owns, under the mask.
    pub fn trace_references(&self, visit: &mut dyn FnMut(&Backtrace)) {
        if let Some(log) = self.mask().log.as_ref() {
            log.trace_references(visit);
        }
    }

    fn mask(&self) -> MutexGuard<'_, SampleState> {
        lock(&self.shared)
    }
}

impl Drop for SampleProfiler {
    fn drop(&mut self) {
        if self.running {
            self.trigger.cancel();
        }
    }
}

fn lock(shared: &Mutex<SampleState>) -> MutexGuard<'_, SampleState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the per-tick callback: one sample, count 1, elapsed = interval.
fn make_tick(shared: Arc<Mutex<SampleState>>, source: SharedSource) -> TickFn {
    Box::new(move || {
        let mut state = lock(&shared);
        let SampleState { log, interval_ms, filter } = &mut *state;
        if let Some(log) = log.as_mut() {
            log.record_sample(source.as_ref(), filter.as_deref(), 1, *interval_ms);
        }
    })
}
