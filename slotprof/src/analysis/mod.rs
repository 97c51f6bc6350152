//! Analysis of Log snapshots
//!
//! Pure functions over [`LogSnapshot`](crate::profile_log::LogSnapshot),
//! separated from printing and export.

pub mod hotspot_analyzer;

pub use hotspot_analyzer::{analyze_functions, analyze_stacks, weight_of, FunctionHotspot, StackHotspot};
