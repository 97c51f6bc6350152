//! Backtraces and the sources that produce them.
//!
//! A [`Backtrace`] is a fixed-depth, sentinel-padded sequence of [`FrameId`]s.
//! Its depth is chosen when the owning Log is created and never changes, so
//! every slot can keep its own copy without reallocating.
//!
//! Capturing the actual call stack is the embedder's job. The engine only
//! asks a [`BacktraceSource`] to walk its frames, innermost first.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::FrameId;

// =============================================================================
// FRAMES AND SOURCES
// =============================================================================

/// One active call frame as reported by a [`BacktraceSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Identity used for equality and hashing.
    pub id: FrameId,
    /// Stable name used by the filter. Frames without one never match.
    pub name: Option<Arc<str>>,
}

impl Frame {
    /// A frame with a stable name.
    #[must_use]
    pub fn named(id: FrameId, name: impl Into<Arc<str>>) -> Self {
        Self { id, name: Some(name.into()) }
    }

    /// A frame without a stable name (e.g. an anonymous closure).
    #[must_use]
    pub fn anonymous(id: FrameId) -> Self {
        Self { id, name: None }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Supplies the currently active call frames.
pub trait BacktraceSource {
    /// Call `visit` for each active frame, innermost first, until it
    /// returns `false` or the frames run out.
    fn walk(&self, visit: &mut dyn FnMut(&Frame) -> bool);
}

impl BacktraceSource for [Frame] {
    fn walk(&self, visit: &mut dyn FnMut(&Frame) -> bool) {
        for frame in self {
            if !visit(frame) {
                break;
            }
        }
    }
}

impl BacktraceSource for Vec<Frame> {
    fn walk(&self, visit: &mut dyn FnMut(&Frame) -> bool) {
        self.as_slice().walk(visit);
    }
}

// =============================================================================
// BACKTRACE
// =============================================================================

/// Fixed-depth, sentinel-padded sequence of frame ids.
///
/// `None` is the sentinel: once the real stack is exhausted every remaining
/// position holds `None`.
#[derive(Debug, Clone)]
pub struct Backtrace {
    frames: Box<[Option<FrameId>]>,
}

impl Backtrace {
    /// An all-sentinel backtrace holding up to `depth` frames.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self { frames: vec![None; depth].into_boxed_slice() }
    }

    /// Build a backtrace of `depth` from `ids`, truncating or padding.
    #[must_use]
    pub fn from_ids(depth: usize, ids: &[FrameId]) -> Self {
        let mut backtrace = Self::new(depth);
        for (slot, id) in backtrace.frames.iter_mut().zip(ids) {
            *slot = Some(*id);
        }
        backtrace
    }

    /// Maximum number of frames this backtrace can hold.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frame at `index`, `None` for the sentinel or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<FrameId> {
        self.frames.get(index).copied().flatten()
    }

    /// True when nothing was captured (first position is the sentinel).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get(0).is_none()
    }

    /// The non-sentinel prefix, innermost frame first.
    pub fn iter(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.frames.iter().map_while(|frame| *frame)
    }

    /// Number of captured frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<FrameId> {
        self.iter().collect()
    }

    /// Overwrite with the first `depth` frames of `source`, padding the rest.
    pub fn capture<S: BacktraceSource + ?Sized>(&mut self, source: &S) {
        self.capture_inspecting(source, &mut |_| false);
    }

    /// Capture like [`capture`](Self::capture) while also handing every
    /// walked frame to `inspect`, all within a single walk of `source`.
    ///
    /// The walk continues past this backtrace's depth for as long as
    /// `inspect` returns `true`.
    pub fn capture_inspecting<S: BacktraceSource + ?Sized>(
        &mut self,
        source: &S,
        inspect: &mut dyn FnMut(&Frame) -> bool,
    ) {
        let frames = &mut self.frames;
        let depth = frames.len();
        let mut filled = 0;
        source.walk(&mut |frame| {
            if filled < depth {
                frames[filled] = Some(frame.id);
                filled += 1;
            }
            let wants_more = inspect(frame);
            filled < depth || wants_more
        });
        frames[filled..].fill(None);
    }

    /// Copy `other` element-wise into this backtrace's own storage.
    ///
    /// Frames beyond this backtrace's depth are dropped; missing positions
    /// are padded with the sentinel.
    pub fn copy_from(&mut self, other: &Backtrace) {
        for (index, slot) in self.frames.iter_mut().enumerate() {
            *slot = other.frames.get(index).copied().flatten();
        }
    }

    /// Reset every position to the sentinel.
    pub fn clear(&mut self) {
        self.frames.fill(None);
    }
}

impl PartialEq for Backtrace {
    /// Element-wise comparison that stops at the first position where both
    /// sides hold the sentinel. Positions past a backtrace's depth read as
    /// the sentinel.
    fn eq(&self, other: &Self) -> bool {
        let len = self.frames.len().max(other.frames.len());
        for index in 0..len {
            let x = self.frames.get(index).copied().flatten();
            let y = other.frames.get(index).copied().flatten();
            match (x, y) {
                (None, None) => break,
                (x, y) if x != y => return false,
                _ => {}
            }
        }
        true
    }
}

impl Eq for Backtrace {}

impl Hash for Backtrace {
    /// Order-sensitive over the captured prefix plus the terminating
    /// sentinel, which keeps it consistent with `eq` across depths.
    fn hash<H: Hasher>(&self, state: &mut H) {
        for frame in self.frames.iter() {
            frame.hash(state);
            if frame.is_none() {
                return;
            }
        }
        None::<FrameId>.hash(state);
    }
}

// =============================================================================
// SHADOW CALL STACK
// =============================================================================

/// A call stack maintained by the host as it enters and leaves functions.
///
/// Cloning shares the same underlying stack, so one clone can be handed to
/// the sampling trigger while the foreground keeps pushing and popping.
///
/// ```
/// use slotprof::backtrace::{Backtrace, CallStack, Frame};
/// use slotprof::domain::FrameId;
///
/// let stack = CallStack::new();
/// let _outer = stack.enter(Frame::named(FrameId(1), "main"));
/// let _inner = stack.enter(Frame::named(FrameId(2), "work"));
///
/// let mut backtrace = Backtrace::new(4);
/// backtrace.capture(&stack);
/// assert_eq!(backtrace.to_vec(), vec![FrameId(2), FrameId(1)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl CallStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `frame`; it is popped again when the returned guard drops.
    #[must_use = "the frame is popped as soon as the guard is dropped"]
    pub fn enter(&self, frame: Frame) -> FrameGuard {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).push(frame);
        FrameGuard { stack: self.clone() }
    }

    /// Number of active frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl BacktraceSource for CallStack {
    fn walk(&self, visit: &mut dyn FnMut(&Frame) -> bool) {
        let frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        for frame in frames.iter().rev() {
            if !visit(frame) {
                break;
            }
        }
    }
}

/// Pops the frame pushed by [`CallStack::enter`] when dropped.
#[derive(Debug)]
pub struct FrameGuard {
    stack: CallStack,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.stack.frames.lock().unwrap_or_else(PoisonError::into_inner).pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(backtrace: &Backtrace) -> u64 {
        let mut hasher = DefaultHasher::new();
        backtrace.hash(&mut hasher);
        hasher.finish()
    }

    fn ids(values: &[u64]) -> Vec<FrameId> {
        values.iter().copied().map(FrameId).collect()
    }

    #[test]
    fn test_from_ids_pads_and_truncates() {
        let short = Backtrace::from_ids(4, &ids(&[1, 2]));
        assert_eq!(short.to_vec(), ids(&[1, 2]));
        assert_eq!(short.get(2), None);
        assert_eq!(short.len(), 2);

        let long = Backtrace::from_ids(2, &ids(&[1, 2, 3]));
        assert_eq!(long.to_vec(), ids(&[1, 2]));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Backtrace::from_ids(3, &ids(&[1, 2]));
        let b = Backtrace::from_ids(3, &ids(&[2, 1]));
        assert_ne!(a, b);
        assert_ne!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_equality_stops_at_common_sentinel() {
        let a = Backtrace::from_ids(2, &ids(&[7]));
        let b = Backtrace::from_ids(5, &ids(&[7]));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_one_sided_sentinel_is_unequal() {
        let a = Backtrace::from_ids(3, &ids(&[7]));
        let b = Backtrace::from_ids(3, &ids(&[7, 8]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_backtraces_are_equal() {
        assert_eq!(Backtrace::new(3), Backtrace::new(3));
        assert!(Backtrace::new(3).is_empty());
    }

    #[test]
    fn test_capture_limits_depth_and_pads() {
        let frames: Vec<Frame> = (1..=5).map(|i| Frame::anonymous(FrameId(i))).collect();
        let mut backtrace = Backtrace::from_ids(3, &ids(&[9, 9, 9]));

        backtrace.capture(&frames);
        assert_eq!(backtrace.to_vec(), ids(&[1, 2, 3]));

        backtrace.capture(&frames[..1]);
        assert_eq!(backtrace.to_vec(), ids(&[1]));
        assert_eq!(backtrace.get(1), None);
    }

    #[test]
    fn test_capture_inspecting_walks_past_depth_on_request() {
        let frames: Vec<Frame> = (1..=5).map(|i| Frame::anonymous(FrameId(i))).collect();
        let mut backtrace = Backtrace::new(2);
        let mut seen = Vec::new();

        backtrace.capture_inspecting(&frames, &mut |frame| {
            seen.push(frame.id);
            frame.id != FrameId(4)
        });
        assert_eq!(backtrace.to_vec(), ids(&[1, 2]));
        assert_eq!(seen, ids(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_copy_is_independent_of_source() {
        let mut scratch = Backtrace::from_ids(2, &ids(&[1, 2]));
        let mut owned = Backtrace::new(2);
        owned.copy_from(&scratch);

        scratch.clear();
        assert_eq!(owned.to_vec(), ids(&[1, 2]));
    }

    #[test]
    fn test_call_stack_walks_innermost_first() {
        let stack = CallStack::new();
        let outer = stack.enter(Frame::named(FrameId(1), "outer"));
        {
            let _inner = stack.enter(Frame::named(FrameId(2), "inner"));
            let mut seen = Vec::new();
            stack.walk(&mut |frame| {
                seen.push(frame.id);
                true
            });
            assert_eq!(seen, ids(&[2, 1]));
        }
        assert_eq!(stack.depth(), 1);
        drop(outer);
        assert_eq!(stack.depth(), 0);
    }
}
