use std::collections::HashMap;
use std::sync::Arc;

use crate::backtrace::Frame;
use crate::domain::FrameId;

/// Name shown for ids the table does not know.
pub const UNKNOWN_FRAME: &str = "<unknown>";

/// Interns frame names to ids and resolves them back.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// `names[i]` is the name of `FrameId(i + 1)`
    names: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, FrameId>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, assigning the next free one on first use.
    pub fn intern(&mut self, name: &str) -> FrameId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let name: Arc<str> = Arc::from(name);
        let id = FrameId(self.names.len() as u64 + 1);
        self.names.push(Arc::clone(&name));
        self.ids.insert(name, id);
        id
    }

    /// Interned [`Frame`] for `name`, sharing the table's copy of the name.
    pub fn frame(&mut self, name: &str) -> Frame {
        let id = self.intern(name);
        let shared = self.ids.get_key_value(name).map(|(name, _)| Arc::clone(name));
        Frame { id, name: shared }
    }

    #[must_use]
    pub fn resolve(&self, id: FrameId) -> Option<&str> {
        Self::index_of(id).and_then(|index| self.names.get(index)).map(AsRef::as_ref)
    }

    /// Like [`resolve`](Self::resolve), falling back to [`UNKNOWN_FRAME`].
    #[must_use]
    pub fn resolve_or_unknown(&self, id: FrameId) -> &str {
        self.resolve(id).unwrap_or(UNKNOWN_FRAME)
    }

    /// Names for a stack, innermost first.
    #[must_use]
    pub fn resolve_stack(&self, frames: &[FrameId]) -> Vec<String> {
        frames.iter().map(|&id| self.resolve_or_unknown(id).to_string()).collect()
    }

    /// One-line rendering of a stack: `leaf <- caller <- root`.
    #[must_use]
    pub fn format_stack(&self, frames: &[FrameId]) -> String {
        frames.iter().map(|&id| self.resolve_or_unknown(id)).collect::<Vec<_>>().join(" <- ")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn index_of(id: FrameId) -> Option<usize> {
        usize::try_from(id.0).ok()?.checked_sub(1)
    }
}
