//! Frame-granularity coalescing of pointer moves.
//!
//! Only the latest position matters because every move recomputes the
//! selection from the anchor, so a burst of moves between two frames
//! collapses to its last sample without changing the result.

use crate::geometry::PointerPoint;

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveCoalescer {
    pending: Option<PointerPoint>,
    /// Moves absorbed since the last flush, for diagnostics
    absorbed: u32,
}

impl MoveCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a move; the latest position wins.
    pub fn push(&mut self, point: PointerPoint) {
        if self.pending.replace(point).is_some() {
            self.absorbed += 1;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending move, if any, and reset the counter.
    pub fn flush(&mut self) -> Option<PointerPoint> {
        self.absorbed = 0;
        self.pending.take()
    }

    pub fn absorbed(&self) -> u32 {
        self.absorbed
    }

    /// Drop any pending move without applying it
    pub fn clear(&mut self) {
        self.pending = None;
        self.absorbed = 0;
    }
}
