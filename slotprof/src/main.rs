//! # slotprof - Main Entry Point
//!
//! Drives the profilers against a deterministic synthetic workload:
//! - **Sampling** (default): a background trigger samples the workload's call stack
//! - **Memory** (`--memory`): the workload reports every allocation to the memory profiler
//!
//! Runs for `--duration` seconds (or until Ctrl+C), then prints the
//! heaviest stacks and functions of each Log and optionally exports them.

// Main function is intentionally long for clarity; time conversions lose precision for display
#![allow(clippy::too_many_lines, clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use slotprof::cli::Args;
use slotprof::config::{ProfilerConfig, Tunables};
use slotprof::export::SnapshotExporter;
use slotprof::profiling::{display_log_summary, display_progress, Profiler, ThreadTrigger};
use slotprof::symbolization::SymbolTable;
use slotprof::workload::Workload;
use slotprof::LogSnapshot;
use slotprof_common::DEFAULT_SAMPLE_INTERVAL_MS;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Workload time between checks for Ctrl+C and the duration limit.
const BATCH: Duration = Duration::from_millis(50);

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("nothing to profile")
        || msg.contains("invalid type of profiler filter")
        || msg.contains("interval must be")
    {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Build tunables from the config file, then let CLI flags override them.
fn resolve_tunables(args: &Args, config: &ProfilerConfig) -> Result<Arc<Tunables>> {
    let tunables = Arc::new(Tunables::default());
    config.apply_tunables(&tunables).context("Invalid sizes in config file")?;
    if let Some(depth) = args.max_stack_depth {
        tunables.set_max_stack_depth(depth);
    }
    if let Some(size) = args.slot_heap_size {
        tunables.set_slot_heap_size(size);
    }
    Ok(tunables)
}

#[tokio::main(flavor = "current_thread")]
async fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    if args.no_sample && !args.memory {
        anyhow::bail!(
            "Nothing to profile: --no-sample disables the only enabled profiler.\n\n\
             Usage:\n  \
             slotprof --no-sample --memory    Allocation profiling only\n\n\
             Run 'slotprof --help' for more options"
        );
    }

    let config = match args.config {
        Some(ref path) => ProfilerConfig::from_file(path).context("Failed to load config")?,
        None => ProfilerConfig::default(),
    };
    let tunables = resolve_tunables(&args, &config)?;
    let interval_ms =
        args.interval.or(config.sample_interval_ms).unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS);

    // ── Workload and profilers ──────────────────────────────────────────
    let mut symbols = SymbolTable::new();
    let mut workload = Workload::new(&mut symbols);
    let mut profiler = Profiler::with_tunables(
        ThreadTrigger::new(),
        Arc::new(workload.call_stack().clone()),
        Arc::clone(&tunables),
    );

    // CLI filter wins over the config file's
    if let Some(ref pattern) = args.filter {
        profiler.set_filter_pattern(Some(pattern));
    } else {
        profiler.set_filter_value(&config.filter).context("Invalid filter in config file")?;
    }

    if !quiet {
        println!("slotprof v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "slots: {} per log, depth: {}",
            tunables.slot_heap_size(),
            tunables.max_stack_depth()
        );
        if let Some(pattern) = profiler.filter_pattern() {
            println!("filter: {pattern:?}");
        }
    }

    if !args.no_sample {
        profiler.sample_mut().start(interval_ms).context("Failed to start sample profiler")?;
        if !quiet {
            println!("sampling: every {interval_ms}ms");
        }
    }
    if args.memory {
        profiler.memory_mut().start().context("Failed to start memory profiler")?;
        if !quiet {
            println!("memory: recording allocations");
        }
    }

    // ── Main loop ───────────────────────────────────────────────────────
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let profiling_start = Instant::now();
    let duration_limit =
        if args.duration > 0 { Some(Duration::from_secs(args.duration)) } else { None };
    let mut exit_reason = "interrupted";
    let mut last_progress = 0;

    loop {
        if let Some(limit) = duration_limit {
            if profiling_start.elapsed() >= limit {
                exit_reason = "duration limit reached";
                break;
            }
        }

        let batch_end = Instant::now() + BATCH;
        while Instant::now() < batch_end {
            workload.step(&mut |stack, bytes| {
                profiler.memory_mut().on_allocation(stack, bytes);
            });
        }

        let elapsed_secs = profiling_start.elapsed().as_secs();
        if !quiet && args.duration > 0 && elapsed_secs != last_progress {
            display_progress(elapsed_secs, args.duration);
            last_progress = elapsed_secs;
        }

        // Let the runtime deliver Ctrl+C between batches
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(1)) => {}
            _ = &mut ctrl_c => {
                break;
            }
        }
    }

    if profiler.sample().is_running() {
        profiler.sample_mut().stop()?;
    }
    if profiler.memory().is_running() {
        profiler.memory_mut().stop()?;
    }

    if !quiet {
        eprintln!(
            "\n{}: {:.1}s, {} workload steps",
            exit_reason,
            profiling_start.elapsed().as_secs_f64(),
            workload.steps()
        );
    }

    let snapshots: Vec<LogSnapshot> =
        [profiler.sample().log(), profiler.memory().log()].into_iter().flatten().collect();
    if snapshots.iter().all(|snapshot| snapshot.records.is_empty()) {
        warn!("No samples recorded (filter too strict or duration too short?)");
    }

    if !quiet {
        for snapshot in &snapshots {
            display_log_summary(snapshot, &symbols, args.top);
        }
    }

    if let Some(ref export_path) = args.export {
        let mut exporter = SnapshotExporter::new(&symbols);
        for snapshot in &snapshots {
            exporter.add_snapshot(snapshot);
        }

        let file = File::create(export_path).context("Failed to create export file")?;
        let writer = BufWriter::new(file);
        exporter.export(writer).context("Failed to export snapshots")?;
        info!("exported {} logs", exporter.log_count());

        if !quiet {
            println!("saved: {}", export_path.display());
        }
    }

    Ok(())
}
