//! # slotprof - Bounded-Memory Stack Aggregation Profiler
//!
//! slotprof aggregates call stacks observed by two profilers into
//! fixed-capacity logs. A time-sampling profiler records the current stack
//! on every tick of a periodic trigger; a memory profiler records the stack
//! of every allocation, weighted by size. Memory stays bounded no matter how
//! long profiling runs: once a log is full the lightest stack is evicted and
//! its totals folded into a single "others" record.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Host Application                         │
//! │          (CallStack push/pop, allocation hook calls)            │
//! └──────────────┬──────────────────────────────┬───────────────────┘
//!                │ ticks (Trigger)              │ on_allocation(bytes)
//!                ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Profiler (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐                    ┌──────────────┐           │
//! │  │    Sample    │   filter::Pattern  │    Memory    │           │
//! │  │  Profiler    │◀──────────────────▶│   Profiler   │           │
//! │  └──────┬───────┘                    └──────┬───────┘           │
//! │         ▼                                   ▼                   │
//! │  ┌──────────────┐                    ┌──────────────┐           │
//! │  │     Log      │                    │     Log      │           │
//! │  │ SlotStore +  │                    │ SlotStore +  │           │
//! │  │   others     │                    │   others     │           │
//! │  └──────┬───────┘                    └──────┬───────┘           │
//! │         └────────────────┬──────────────────┘                   │
//! │                          ▼ LogSnapshot                          │
//! │            ┌──────────────┐   ┌──────────────┐                  │
//! │            │   Analysis   │   │    Export    │                  │
//! │            │  (Hotspots)  │   │   (JSON)     │                  │
//! │            └──────────────┘   └──────────────┘                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Engine
//!
//! - [`backtrace`]: fixed-depth backtraces, frame sources and the shadow `CallStack`
//! - [`store`]: the slot store (arena + free list + hash chains, min-weight eviction)
//! - [`profile_log`]: one store plus the "others" bucket, snapshots, reference tracing
//! - [`filter`]: wildcard filter applied before a sample is recorded
//!
//! ### Controllers
//!
//! - [`profiling`]: sample and memory profilers, triggers, the `Profiler` facade
//! - [`config`]: process-wide tunables and the JSON config file
//!
//! ### Reporting
//!
//! - [`symbolization`]: frame name interning and resolution
//! - [`analysis`]: hotspot ranking by stack and by function
//! - [`export`]: JSON snapshot export
//!
//! ### Driver
//!
//! - [`cli`]: command-line arguments
//! - [`workload`]: deterministic synthetic workload used by the binary
//! - [`domain`]: core types and errors
//!
//! ## Typical Usage
//!
//! ```
//! use std::sync::Arc;
//! use slotprof::backtrace::CallStack;
//! use slotprof::profiling::{ManualTrigger, Profiler};
//! use slotprof::symbolization::SymbolTable;
//!
//! let mut symbols = SymbolTable::new();
//! let stack = CallStack::new();
//! let trigger = ManualTrigger::new();
//! let mut profiler = Profiler::new(trigger.clone(), Arc::new(stack.clone()));
//!
//! profiler.sample_mut().start(10)?;
//! let _main = stack.enter(symbols.frame("main"));
//! trigger.fire();
//! profiler.sample_mut().stop()?;
//!
//! let snapshot = profiler.sample().log().expect("log exists after start");
//! assert_eq!(snapshot.total_elapsed(), 10);
//! # Ok::<(), slotprof::domain::ProfilerError>(())
//! ```

pub mod analysis;
pub mod backtrace;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod filter;
pub mod profile_log;
pub mod profiling;
pub mod store;
pub mod symbolization;
pub mod workload;

pub use profile_log::{Log, LogSnapshot, StackKey, StackRecord};
pub use profiling::Profiler;
