//! Profiler controllers
//!
//! - Sampling triggers (background thread or host-driven)
//! - Sample profiler (masked by its shared-state lock)
//! - Memory profiler (allocation hook, unmasked)
//! - `Profiler` facade owning both plus the shared filter
//! - Console reports

pub mod memory;
pub mod profiler;
pub mod report;
pub mod sample;
pub mod trigger;

// Re-export common types
pub use memory::MemoryProfiler;
pub use profiler::Profiler;
pub use report::{display_log_summary, display_progress};
pub use sample::{SampleProfiler, SharedSource};
pub use trigger::{ManualTrigger, ThreadTrigger, TickFn, Trigger};
