// Time conversions intentionally lose precision for display purposes
#![allow(clippy::cast_precision_loss)]

use std::io::Write;

use crate::analysis::{analyze_functions, analyze_stacks, weight_of};
use crate::domain::ProfilerKind;
use crate::export::OTHERS_FRAME;
use crate::profile_log::{LogSnapshot, StackKey};
use crate::symbolization::SymbolTable;

fn format_weight(kind: ProfilerKind, weight: u64) -> String {
    match kind {
        ProfilerKind::Sample => format!("{weight}ms"),
        ProfilerKind::Memory if weight >= 1024 * 1024 => {
            format!("{:.1}MiB", weight as f64 / (1024.0 * 1024.0))
        }
        ProfilerKind::Memory if weight >= 1024 => format!("{:.1}KiB", weight as f64 / 1024.0),
        ProfilerKind::Memory => format!("{weight}B"),
    }
}

/// Print the `top` heaviest stacks and functions of a snapshot.
pub fn display_log_summary(snapshot: &LogSnapshot, symbols: &SymbolTable, top: usize) {
    let total = snapshot.records.iter().map(|r| weight_of(snapshot.kind, r)).sum();
    println!(
        "\n{} log: {} stacks, {} total ({:.1}s)",
        snapshot.kind,
        snapshot.stacks().count(),
        format_weight(snapshot.kind, total),
        snapshot.taken_at.0 - snapshot.created_at.0,
    );

    if snapshot.records.is_empty() {
        println!("  (no samples)");
        return;
    }

    println!("  STACKS");
    for hotspot in analyze_stacks(snapshot).iter().take(top) {
        let stack = match &hotspot.key {
            StackKey::Others => OTHERS_FRAME.to_string(),
            StackKey::Frames(frames) => symbols.format_stack(frames),
        };
        println!(
            "  {:>5.1}%  {:>9}  {stack}",
            hotspot.percentage,
            format_weight(snapshot.kind, hotspot.weight)
        );
    }

    println!("  FUNCTIONS");
    for hotspot in analyze_functions(snapshot).iter().take(top) {
        let name = hotspot.leaf.map_or(OTHERS_FRAME, |id| symbols.resolve_or_unknown(id));
        println!(
            "  {:>5.1}%  {:>9}  {name} ({} stacks)",
            hotspot.percentage,
            format_weight(snapshot.kind, hotspot.weight),
            hotspot.stacks
        );
    }
}

/// Display progress while profiling for a fixed duration
pub fn display_progress(elapsed_secs: u64, duration: u64) {
    let remaining_secs = duration.saturating_sub(elapsed_secs);
    print!("\r   Progress: {elapsed_secs}s / {duration}s ({remaining_secs}s remaining)   ");
    std::io::stdout().flush().ok();
}
