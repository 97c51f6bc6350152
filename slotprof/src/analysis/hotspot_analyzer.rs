//! Hotspot ranking for Log snapshots.
//!
//! # Weight
//!
//! A record's weight is what the profiler measures:
//!
//! - **sample** Logs: `elapsed` (milliseconds of sampled time)
//! - **memory** Logs: `count` (bytes allocated)
//!
//! Percentages are taken against the total weight of the snapshot, "others"
//! included, so the ranked entries of a truncated Log do not add up to 100%.
//!
//! ## Display
//!
//! ```text
//! STACKS (sample)
//! ─────────────────────────────────
//!   42.3%   423ms  parse_row <- load <- main
//!   18.7%   187ms  <others>
//! ```

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use crate::domain::{FrameId, ProfilerKind};
use crate::profile_log::{LogSnapshot, StackKey, StackRecord};

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// One snapshot record with its weight and share of the total.
#[derive(Debug, Clone, PartialEq)]
pub struct StackHotspot {
    pub key: StackKey,
    pub count: u64,
    pub elapsed: u64,
    pub weight: u64,
    /// Share of total weight (0.0 - 100.0).
    pub percentage: f64,
}

/// Weight aggregated by innermost frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHotspot {
    /// Innermost frame, or `None` for the "others" bucket.
    pub leaf: Option<FrameId>,
    pub weight: u64,
    /// Share of total weight (0.0 - 100.0).
    pub percentage: f64,
    /// Number of distinct stacks ending in this frame.
    pub stacks: usize,
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Weight of `record` in a Log of `kind`.
#[must_use]
pub fn weight_of(kind: ProfilerKind, record: &StackRecord) -> u64 {
    match kind {
        ProfilerKind::Sample => record.elapsed,
        ProfilerKind::Memory => record.count,
    }
}

fn total_weight(snapshot: &LogSnapshot) -> u64 {
    snapshot.records.iter().map(|record| weight_of(snapshot.kind, record)).sum()
}

fn percentage(weight: u64, total: u64) -> f64 {
    if total > 0 {
        (weight as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Rank every record by weight, heaviest first.
///
/// The sort is stable, so equal weights keep snapshot order.
#[must_use]
pub fn analyze_stacks(snapshot: &LogSnapshot) -> Vec<StackHotspot> {
    let total = total_weight(snapshot);
    let mut hotspots: Vec<StackHotspot> = snapshot
        .records
        .iter()
        .map(|record| {
            let weight = weight_of(snapshot.kind, record);
            StackHotspot {
                key: record.key.clone(),
                count: record.count,
                elapsed: record.elapsed,
                weight,
                percentage: percentage(weight, total),
            }
        })
        .collect();

    hotspots.sort_by_key(|h| std::cmp::Reverse(h.weight));
    hotspots
}

/// Aggregate weight by innermost frame, heaviest first.
///
/// Ties keep the order in which each frame first appears in the snapshot.
#[must_use]
pub fn analyze_functions(snapshot: &LogSnapshot) -> Vec<FunctionHotspot> {
    let total = total_weight(snapshot);
    let mut index: HashMap<Option<FrameId>, usize> = HashMap::new();
    let mut hotspots: Vec<FunctionHotspot> = Vec::new();

    for record in &snapshot.records {
        let leaf = match &record.key {
            StackKey::Others => None,
            StackKey::Frames(frames) => match frames.first() {
                Some(&leaf) => Some(leaf),
                None => continue,
            },
        };
        let slot = *index.entry(leaf).or_insert_with(|| {
            hotspots.push(FunctionHotspot { leaf, weight: 0, percentage: 0.0, stacks: 0 });
            hotspots.len() - 1
        });
        let hotspot = &mut hotspots[slot];
        hotspot.weight += weight_of(snapshot.kind, record);
        hotspot.stacks += 1;
    }

    for hotspot in &mut hotspots {
        hotspot.percentage = percentage(hotspot.weight, total);
    }
    hotspots.sort_by_key(|h| std::cmp::Reverse(h.weight));
    hotspots
}
