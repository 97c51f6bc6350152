use std::io::Write;

use serde::Serialize;

use crate::domain::{ExportError, ProfilerKind};
use crate::profile_log::{LogSnapshot, StackKey};
use crate::symbolization::SymbolTable;

/// Name written in place of a frame list for the "others" record.
pub const OTHERS_FRAME: &str = "<others>";

/// JSON document root
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    version: &'static str,
    logs: &'a [ExportedLog],
}

#[derive(Debug, Clone, Serialize)]
struct ExportedLog {
    kind: ProfilerKind,
    /// Seconds since the Unix epoch
    created_at: f64,
    taken_at: f64,
    total_count: u64,
    total_elapsed: u64,
    records: Vec<ExportedRecord>,
}

#[derive(Debug, Clone, Serialize)]
struct ExportedRecord {
    /// Innermost first
    frames: Vec<String>,
    /// Empty for the "others" record
    frame_ids: Vec<u64>,
    count: u64,
    elapsed: u64,
}

/// Collects snapshots and writes them as one JSON document.
pub struct SnapshotExporter<'a> {
    symbols: &'a SymbolTable,
    logs: Vec<ExportedLog>,
}

impl<'a> SnapshotExporter<'a> {
    #[must_use]
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols, logs: Vec::new() }
    }

    /// Resolve and queue one snapshot.
    pub fn add_snapshot(&mut self, snapshot: &LogSnapshot) {
        let records = snapshot
            .records
            .iter()
            .map(|record| match &record.key {
                StackKey::Others => ExportedRecord {
                    frames: vec![OTHERS_FRAME.to_string()],
                    frame_ids: Vec::new(),
                    count: record.count,
                    elapsed: record.elapsed,
                },
                StackKey::Frames(ids) => ExportedRecord {
                    frames: self.symbols.resolve_stack(ids),
                    frame_ids: ids.iter().map(|id| id.0).collect(),
                    count: record.count,
                    elapsed: record.elapsed,
                },
            })
            .collect();

        self.logs.push(ExportedLog {
            kind: snapshot.kind,
            created_at: snapshot.created_at.0,
            taken_at: snapshot.taken_at.0,
            total_count: snapshot.total_count(),
            total_elapsed: snapshot.total_elapsed(),
            records,
        });
    }

    /// Write every queued snapshot to `writer`.
    ///
    /// ```
    /// use slotprof::export::SnapshotExporter;
    /// use slotprof::symbolization::SymbolTable;
    ///
    /// let symbols = SymbolTable::new();
    /// let exporter = SnapshotExporter::new(&symbols);
    ///
    /// let mut buffer = Vec::new();
    /// exporter.export(&mut buffer).unwrap();
    /// assert!(String::from_utf8(buffer).unwrap().contains("\"logs\": []"));
    /// ```
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        let document = ExportDocument { version: env!("CARGO_PKG_VERSION"), logs: &self.logs };
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Number of queued snapshots.
    #[must_use]
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}
