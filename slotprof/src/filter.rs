//! Filter patterns applied to backtraces before they are recorded.
//!
//! A sample passes when no pattern is set, or when any frame in the current
//! call stack has a name matching the pattern. The whole stack is scanned,
//! not just the frames that fit in a Log's capture depth.

use serde_json::Value;

pub use slotprof_common::pattern::Pattern;

use crate::backtrace::{Backtrace, BacktraceSource};
use crate::domain::ProfilerError;

/// Capture `source` into `backtrace` and test it against `pattern`.
///
/// Both happen in one walk of `source`, so the verdict describes exactly
/// the frames that were captured. Returns true if `pattern` is unset or
/// matches the name of any frame in `source`.
pub fn capture_matching<S: BacktraceSource + ?Sized>(
    pattern: Option<&Pattern>,
    source: &S,
    backtrace: &mut Backtrace,
) -> bool {
    let mut matched = pattern.is_none();
    backtrace.capture_inspecting(source, &mut |frame| {
        if let Some(pattern) = pattern {
            matched = matched || frame.name().is_some_and(|name| pattern.matches(name));
        }
        !matched
    });
    matched
}

/// Compile a filter from a host value: `null` clears, a string sets.
///
/// # Errors
/// Returns [`ProfilerError::InvalidFilterType`] for any other JSON type.
pub fn pattern_from_value(value: &Value) -> Result<Option<Pattern>, ProfilerError> {
    match value {
        Value::Null => Ok(None),
        Value::String(pattern) => Ok(Some(Pattern::parse(pattern))),
        other => Err(ProfilerError::InvalidFilterType(json_type_name(other).to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
