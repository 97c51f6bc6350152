//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use slotprof_common::FrameId;

/// Which profiler a Log belongs to.
///
/// Also decides what `elapsed` means for the Log's slots: milliseconds of
/// sampled time for [`ProfilerKind::Sample`], bytes for
/// [`ProfilerKind::Memory`] (where `count` carries the bytes and `elapsed`
/// stays zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfilerKind {
    Sample,
    Memory,
}

impl fmt::Display for ProfilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample => write!(f, "sample"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Wall-clock time in seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// Current wall-clock time. A clock set before 1970 reads as zero.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self(secs)
    }
}
