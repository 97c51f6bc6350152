//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "slotprof",
    version,
    about = "Bounded-memory sampling and allocation profiler (synthetic workload driver)",
    after_help = "\
EXAMPLES:
    slotprof                                 Sample a 5s synthetic run every 10ms
    slotprof --memory --duration 2           Sample and record allocations for 2s
    slotprof --no-sample --memory            Allocation profiling only
    slotprof --filter '*parse*' --top 5      Keep only stacks through parse functions
    slotprof --config slotprof.json --export profile.json"
)]
pub struct Args {
    /// Sampling interval in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Stop after N seconds (0 = until Ctrl+C)
    #[arg(short, long, default_value = "5")]
    pub duration: u64,

    /// Also record allocations with the memory profiler
    #[arg(short, long)]
    pub memory: bool,

    /// Disable the time-sampling profiler
    #[arg(long)]
    pub no_sample: bool,

    /// Wildcard pattern a stack must match to be recorded (e.g. 'app::*')
    #[arg(short, long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// JSON config file (CLI flags take precedence)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum frames captured per sample
    #[arg(long, value_name = "N")]
    pub max_stack_depth: Option<usize>,

    /// Unique stacks kept per Log before eviction
    #[arg(long, value_name = "N")]
    pub slot_heap_size: Option<usize>,

    /// Export snapshots to a JSON file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Number of stacks and functions to print per Log
    #[arg(short, long, default_value = "10")]
    pub top: usize,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["slotprof"]);
        assert_eq!(args.interval, None);
        assert_eq!(args.duration, 5);
        assert_eq!(args.top, 10);
        assert!(!args.memory);
        assert!(!args.no_sample);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "slotprof",
            "--interval",
            "2",
            "--duration",
            "0",
            "--memory",
            "--no-sample",
            "--filter",
            "app::*",
            "--max-stack-depth",
            "8",
            "--slot-heap-size",
            "128",
            "--export",
            "out.json",
            "--quiet",
        ]);
        assert_eq!(args.interval, Some(2));
        assert_eq!(args.duration, 0);
        assert!(args.memory && args.no_sample && args.quiet);
        assert_eq!(args.filter.as_deref(), Some("app::*"));
        assert_eq!(args.max_stack_depth, Some(8));
        assert_eq!(args.slot_heap_size, Some(128));
        assert_eq!(args.export, Some(PathBuf::from("out.json")));
    }
}
