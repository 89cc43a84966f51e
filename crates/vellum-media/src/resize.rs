//! Pointer-driven media resizing.
//!
//! A drag captures the node's rendered box and the pointer origin once, at
//! drag start; every move is computed from that snapshot. Only the final
//! commit touches the document — intermediate frames stay in the view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use vellum_core::AttrPatch;

/// Resized media never goes below this, on either axis.
pub const MIN_MEDIA_DIMENSION: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The global text-selection lock held while a resize drag is in flight.
/// Dropping the guard is the only release path, so mouse-up, drag abort,
/// and teardown all funnel through it.
#[derive(Clone, Default)]
pub struct SelectionLockState {
    locked: Arc<AtomicBool>,
}

impl SelectionLockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> SelectionLockGuard {
        self.locked.store(true, Ordering::SeqCst);
        SelectionLockGuard {
            locked: Arc::clone(&self.locked),
        }
    }
}

pub struct SelectionLockGuard {
    locked: Arc<AtomicBool>,
}

impl Drop for SelectionLockGuard {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::SeqCst);
    }
}

/// One in-flight resize gesture.
pub struct ResizeDrag {
    start: BoundingBox,
    origin: (f32, f32),
    _lock: SelectionLockGuard,
}

impl ResizeDrag {
    pub fn begin(start: BoundingBox, pointer: (f32, f32), locks: &SelectionLockState) -> Self {
        log::debug!(
            "resize drag started at {:?} from {}x{}",
            pointer,
            start.width,
            start.height
        );
        Self {
            start,
            origin: pointer,
            _lock: locks.acquire(),
        }
    }

    /// Dimensions for the current pointer position. With `keep_aspect`, the
    /// axis with the larger travel drives and the other follows the original
    /// ratio; the 50 px floor re-derives the driven axis so the ratio holds.
    pub fn preview(&self, pointer: (f32, f32), keep_aspect: bool) -> BoundingBox {
        let dx = pointer.0 - self.origin.0;
        let dy = pointer.1 - self.origin.1;

        if !keep_aspect {
            return BoundingBox {
                width: (self.start.width + dx).max(MIN_MEDIA_DIMENSION),
                height: (self.start.height + dy).max(MIN_MEDIA_DIMENSION),
            };
        }

        let ratio = if self.start.height > 0.0 {
            self.start.width / self.start.height
        } else {
            1.0
        };

        if dx.abs() >= dy.abs() {
            let mut width = (self.start.width + dx).max(MIN_MEDIA_DIMENSION);
            let mut height = width / ratio;
            if height < MIN_MEDIA_DIMENSION {
                height = MIN_MEDIA_DIMENSION;
                width = height * ratio;
            }
            BoundingBox { width, height }
        } else {
            let mut height = (self.start.height + dy).max(MIN_MEDIA_DIMENSION);
            let mut width = height * ratio;
            if width < MIN_MEDIA_DIMENSION {
                width = MIN_MEDIA_DIMENSION;
                height = width / ratio;
            }
            BoundingBox { width, height }
        }
    }

    /// Final dimensions on mouse-up, releasing the selection lock.
    pub fn commit(self, pointer: (f32, f32), keep_aspect: bool) -> (u32, u32) {
        let end = self.preview(pointer, keep_aspect);
        (end.width.round() as u32, end.height.round() as u32)
    }

    /// Abandon the drag; the lock releases and the document is untouched.
    pub fn abort(self) {
        log::debug!("resize drag aborted");
    }
}

/// The attribute patch a committed resize applies to its media node.
pub fn dimension_patch(width: u32, height: u32) -> AttrPatch {
    let mut patch = AttrPatch::default();
    patch
        .set
        .insert("width".to_string(), Value::String(format!("{width}px")));
    patch
        .set
        .insert("height".to_string(), Value::String(format!("{height}px")));
    patch
}
