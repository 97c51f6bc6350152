//! Process-wide tunables and the optional JSON config file.
//!
//! Tunables are read exactly once per Log, when the Log is created. Changing
//! them afterwards never resizes a live Log; reset a stopped profiler to make
//! its next start pick up the new values.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use serde_json::Value;
use slotprof_common::{DEFAULT_MAX_STACK_DEPTH, DEFAULT_SLOT_HEAP_SIZE};

use crate::domain::{ConfigError, ProfilerError};

/// Shared, mutable sizing knobs for newly created Logs.
#[derive(Debug)]
pub struct Tunables {
    max_stack_depth: AtomicUsize,
    slot_heap_size: AtomicUsize,
}

impl Tunables {
    #[must_use]
    pub fn new(max_stack_depth: usize, slot_heap_size: usize) -> Self {
        Self {
            max_stack_depth: AtomicUsize::new(max_stack_depth),
            slot_heap_size: AtomicUsize::new(slot_heap_size),
        }
    }

    /// Bound on captured frames per sample.
    #[must_use]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth.load(Ordering::Relaxed)
    }

    pub fn set_max_stack_depth(&self, depth: usize) {
        self.max_stack_depth.store(depth, Ordering::Relaxed);
    }

    /// Slot store capacity per Log.
    #[must_use]
    pub fn slot_heap_size(&self) -> usize {
        self.slot_heap_size.load(Ordering::Relaxed)
    }

    pub fn set_slot_heap_size(&self, size: usize) {
        self.slot_heap_size.store(size, Ordering::Relaxed);
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STACK_DEPTH, DEFAULT_SLOT_HEAP_SIZE)
    }
}

/// Contents of a `--config` JSON file. Every field is optional.
///
/// ```json
/// {
///   "max_stack_depth": 32,
///   "slot_heap_size": 4096,
///   "sample_interval_ms": 5,
///   "filter": "*handler*"
/// }
/// ```
///
/// `filter` is kept as a raw JSON value: `null` (or absent) means no
/// filter, a string is a wildcard pattern, anything else is rejected when
/// the config is applied.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilerConfig {
    pub max_stack_depth: Option<usize>,
    pub slot_heap_size: Option<usize>,
    pub sample_interval_ms: Option<u64>,
    #[serde(default)]
    pub filter: Value,
}

impl ProfilerConfig {
    /// Load a config from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid config JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFailed { path: path.to_path_buf(), source })?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string.
    ///
    /// # Errors
    /// Returns an error if `json` is not valid config JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Copy the sizing fields that are set into `tunables`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Profiler`] if a set field is zero; `tunables`
    /// is left untouched in that case.
    pub fn apply_tunables(&self, tunables: &Tunables) -> Result<(), ConfigError> {
        if self.max_stack_depth == Some(0) {
            return Err(ProfilerError::ZeroStackDepth.into());
        }
        if self.slot_heap_size == Some(0) {
            return Err(ProfilerError::ZeroCapacity.into());
        }
        if let Some(depth) = self.max_stack_depth {
            tunables.set_max_stack_depth(depth);
        }
        if let Some(size) = self.slot_heap_size {
            tunables.set_slot_heap_size(size);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tunables_default() {
        let tunables = Tunables::default();
        assert_eq!(tunables.max_stack_depth(), 16);
        assert_eq!(tunables.slot_heap_size(), 10_000);
    }

    #[test]
    fn test_config_parses_all_fields() {
        let config = ProfilerConfig::from_json(
            r#"{"max_stack_depth": 8, "slot_heap_size": 64, "sample_interval_ms": 5, "filter": "a*"}"#,
        )
        .unwrap();
        assert_eq!(config.max_stack_depth, Some(8));
        assert_eq!(config.slot_heap_size, Some(64));
        assert_eq!(config.sample_interval_ms, Some(5));
        assert_eq!(config.filter, Value::String("a*".to_string()));
    }

    #[test]
    fn test_missing_filter_reads_as_null() {
        let config = ProfilerConfig::from_json("{}").unwrap();
        assert_eq!(config.filter, Value::Null);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(ProfilerConfig::from_json(r#"{"slot_heap": 1}"#).is_err());
    }

    #[test]
    fn test_apply_only_overrides_set_fields() {
        let tunables = Tunables::default();
        let config = ProfilerConfig { slot_heap_size: Some(32), ..ProfilerConfig::default() };
        config.apply_tunables(&tunables).unwrap();
        assert_eq!(tunables.slot_heap_size(), 32);
        assert_eq!(tunables.max_stack_depth(), 16);
    }

    #[test]
    fn test_apply_rejects_zero_sizes() {
        let tunables = Tunables::new(4, 8);
        let config = ProfilerConfig::from_json(r#"{"max_stack_depth": 2, "slot_heap_size": 0}"#).unwrap();

        let err = config.apply_tunables(&tunables).unwrap_err();
        assert!(matches!(err, ConfigError::Profiler(ProfilerError::ZeroCapacity)));
        assert_eq!(err.to_string(), "Slot heap size must be at least 1");
        assert_eq!(tunables.max_stack_depth(), 4);
        assert_eq!(tunables.slot_heap_size(), 8);

        let config = ProfilerConfig { max_stack_depth: Some(0), ..ProfilerConfig::default() };
        assert!(matches!(
            config.apply_tunables(&tunables),
            Err(ConfigError::Profiler(ProfilerError::ZeroStackDepth))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_stack_depth": 4}}"#).unwrap();
        let config = ProfilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_stack_depth, Some(4));

        let err = ProfilerConfig::from_file("/nonexistent/slotprof.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }
}
