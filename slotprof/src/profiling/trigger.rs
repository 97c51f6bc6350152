//! Periodic triggers that drive the sample profiler.
//!
//! A trigger only delivers ticks. Masking is not the trigger's business: the
//! tick callback locks the sample profiler's shared state, so a foreground
//! call holding that lock delays the tick until it is done.
//!
//! - [`ThreadTrigger`] - background thread paced by `crossbeam_channel::tick`
//! - [`ManualTrigger`] - ticks fired explicitly by a host run-loop or a test

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Sender};
use log::{debug, warn};

use crate::domain::ProfilerError;

/// Callback run on every tick.
pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Source of periodic ticks.
pub trait Trigger: Send {
    /// Start calling `tick` every `interval`, replacing any earlier install.
    ///
    /// # Errors
    /// Returns [`ProfilerError::TriggerInstallFailed`] if ticks cannot be
    /// scheduled; nothing is installed in that case.
    fn install(&mut self, interval: Duration, tick: TickFn) -> Result<(), ProfilerError>;

    /// Stop ticking. No tick is running once this returns.
    fn cancel(&mut self);
}

// =============================================================================
// THREAD TRIGGER
// =============================================================================

struct TickerThread {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Delivers ticks from a dedicated background thread.
#[derive(Default)]
pub struct ThreadTrigger {
    worker: Option<TickerThread>,
}

impl ThreadTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.worker.is_some()
    }
}

impl Trigger for ThreadTrigger {
    fn install(&mut self, interval: Duration, mut tick: TickFn) -> Result<(), ProfilerError> {
        self.cancel();

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = std::thread::Builder::new()
            .name("slotprof-sampler".to_string())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => tick(),
                        // The sender is dropped on cancel
                        recv(stop_rx) -> _ => break,
                    }
                }
            })
            .map_err(|e| ProfilerError::TriggerInstallFailed(e.to_string()))?;

        debug!("sampler thread started ({interval:?} interval)");
        self.worker = Some(TickerThread { stop_tx, handle });
        Ok(())
    }

    fn cancel(&mut self) {
        let Some(TickerThread { stop_tx, handle }) = self.worker.take() else {
            return;
        };
        drop(stop_tx);
        if handle.join().is_err() {
            warn!("sampler thread panicked");
        } else {
            debug!("sampler thread stopped");
        }
    }
}

impl Drop for ThreadTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// MANUAL TRIGGER
// =============================================================================

#[derive(Default)]
struct ManualState {
    interval: Option<Duration>,
    tick: Option<TickFn>,
}

/// Trigger whose ticks are fired by calling [`ManualTrigger::fire`].
///
/// Clones share state, so keep one clone to fire ticks after handing
/// another to a profiler.
#[derive(Clone, Default)]
pub struct ManualTrigger {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the installed tick once. Returns `false` if nothing is installed.
    pub fn fire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.tick.as_mut() {
            Some(tick) => {
                tick();
                true
            }
            None => false,
        }
    }

    /// Interval of the current install, if any.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).interval
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).tick.is_some()
    }
}

impl Trigger for ManualTrigger {
    fn install(&mut self, interval: Duration, tick: TickFn) -> Result<(), ProfilerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.interval = Some(interval);
        state.tick = Some(tick);
        Ok(())
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.interval = None;
        state.tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tick(counter: &Arc<AtomicUsize>) -> TickFn {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_manual_trigger_fires_only_when_installed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut trigger = ManualTrigger::new();
        let handle = trigger.clone();

        assert!(!handle.fire());
        trigger.install(Duration::from_millis(5), counting_tick(&counter)).unwrap();
        assert_eq!(handle.interval(), Some(Duration::from_millis(5)));
        assert!(handle.fire());
        assert!(handle.fire());

        trigger.cancel();
        assert!(!handle.fire());
        assert!(!handle.is_installed());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_thread_trigger_ticks_until_cancelled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut trigger = ThreadTrigger::new();
        trigger.install(Duration::from_millis(1), counting_tick(&counter)).unwrap();
        assert!(trigger.is_installed());

        std::thread::sleep(Duration::from_millis(100));
        trigger.cancel();
        let after_cancel = counter.load(Ordering::SeqCst);
        assert!(after_cancel > 0, "expected at least one tick");

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_cancel);
        assert!(!trigger.is_installed());
    }

    #[test]
    fn test_reinstall_replaces_previous_thread() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut trigger = ThreadTrigger::new();

        trigger.install(Duration::from_millis(1), counting_tick(&first)).unwrap();
        trigger.install(Duration::from_millis(1), counting_tick(&second)).unwrap();
        let frozen = first.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        drop(trigger);

        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) > 0);
    }
}
