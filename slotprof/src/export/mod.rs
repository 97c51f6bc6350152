//! Snapshot export
//!
//! Writes Log snapshots as JSON with frame names resolved, for loading
//! into other tools or diffing between runs.

pub mod snapshot_json;

pub use snapshot_json::{SnapshotExporter, OTHERS_FRAME};
