//! Selection gesture state machine.
//!
//! ```text
//! Idle --pointer-down on surface--> Dragging --pointer-up--> Idle
//!  ^  \__scroll: hide overlay        |  \__move / scroll: stay
//!  |                                 |
//!  +-------------cancel--------------+
//! ```
//!
//! The machine stores only the gesture state. The overlay rectangle is a
//! pure function of that state and is recomputed on every read.

use crate::geometry::{normalize_rect, PointerPoint, SelectionRect};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle {
        /// Overlay left on screen by a finalized gesture, keyed by gesture number
        lingering: Option<(u64, SelectionRect)>,
    },
    Dragging {
        gesture: u64,
        /// Fixed for the whole gesture
        anchor: PointerPoint,
        current: PointerPoint,
    },
}

impl GestureState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, GestureState::Dragging { .. })
    }
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState::Idle { lingering: None }
    }
}

/// Outcome of a pointer-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finalization {
    /// No gesture was active
    NotDragging,
    /// Zero width or height; nothing to capture
    Degenerate { gesture: u64 },
    /// A rectangle worth capturing
    Capture { gesture: u64, rect: SelectionRect },
}

#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: GestureState,
    next_gesture: u64,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// The overlay as it should be drawn right now
    pub fn overlay(&self) -> SelectionRect {
        match self.state {
            GestureState::Dragging {
                anchor, current, ..
            } => normalize_rect(anchor, current),
            GestureState::Idle {
                lingering: Some((_, rect)),
            } => rect,
            GestureState::Idle { lingering: None } => SelectionRect::hidden(),
        }
    }

    /// Start a gesture at `point` when idle and `eligible`.
    ///
    /// Returns the zero-size overlay at the anchor when a gesture started.
    pub fn pointer_down(&mut self, point: PointerPoint, eligible: bool) -> Option<SelectionRect> {
        if !eligible || self.is_dragging() {
            return None;
        }
        self.next_gesture += 1;
        let gesture = self.next_gesture;
        self.state = GestureState::Dragging {
            gesture,
            anchor: point,
            current: point,
        };
        debug!("gesture #{} started at ({}, {})", gesture, point.x, point.y);
        Some(self.overlay())
    }

    /// Track the pointer while dragging; ignored when idle.
    pub fn pointer_move(&mut self, point: PointerPoint) -> Option<SelectionRect> {
        match &mut self.state {
            GestureState::Dragging { current, .. } => {
                *current = point;
                Some(self.overlay())
            }
            GestureState::Idle { .. } => None,
        }
    }

    /// End the gesture. `point` is the release position when the host has one.
    pub fn pointer_up(&mut self, point: Option<PointerPoint>) -> Finalization {
        let GestureState::Dragging {
            gesture,
            anchor,
            current,
        } = self.state
        else {
            return Finalization::NotDragging;
        };
        let rect = normalize_rect(anchor, point.unwrap_or(current));
        if rect.is_degenerate() {
            self.state = GestureState::Idle { lingering: None };
            debug!("gesture #{} ended with an empty selection", gesture);
            return Finalization::Degenerate { gesture };
        }
        self.state = GestureState::Idle {
            lingering: Some((gesture, rect)),
        };
        debug!(
            "gesture #{} finalized {}x{} at ({}, {})",
            gesture, rect.width, rect.height, rect.left, rect.top
        );
        Finalization::Capture { gesture, rect }
    }

    /// Scrolling hides a stale overlay when idle and never disturbs a drag.
    /// Returns true when an overlay was hidden.
    pub fn scroll(&mut self) -> bool {
        match &mut self.state {
            GestureState::Idle { lingering } => lingering.take().is_some(),
            GestureState::Dragging { .. } => false,
        }
    }

    /// Abandon an active drag without capturing. Returns true when one was active.
    pub fn cancel(&mut self) -> bool {
        if let GestureState::Dragging { gesture, .. } = self.state {
            debug!("gesture #{} canceled", gesture);
            self.state = GestureState::Idle { lingering: None };
            return true;
        }
        false
    }

    /// Hide the overlay left by `gesture`, if it is still the one shown.
    pub fn clear_if(&mut self, gesture: u64) -> bool {
        if let GestureState::Idle { lingering } = &mut self.state {
            if lingering.is_some_and(|(g, _)| g == gesture) {
                *lingering = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PointerPoint {
        PointerPoint::new(x, y)
    }

    #[test]
    fn down_on_surface_shows_zero_size_overlay() {
        let mut m = SelectionMachine::new();
        let rect = m.pointer_down(p(100.0, 100.0), true).unwrap();
        assert!(rect.visible);
        assert_eq!((rect.left, rect.top, rect.width, rect.height), (100.0, 100.0, 0.0, 0.0));
        assert!(m.is_dragging());
    }

    #[test]
    fn ineligible_down_stays_idle() {
        let mut m = SelectionMachine::new();
        assert!(m.pointer_down(p(1.0, 1.0), false).is_none());
        assert_eq!(*m.state(), GestureState::Idle { lingering: None });
        assert!(!m.overlay().visible);
    }

    #[test]
    fn moves_recompute_from_anchor() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(100.0, 100.0), true);
        m.pointer_move(p(300.0, 10.0));
        let r = m.pointer_move(p(40.0, 30.0)).unwrap();
        assert_eq!((r.left, r.top, r.width, r.height), (40.0, 30.0, 60.0, 70.0));
        assert_eq!(m.overlay(), r);
    }

    #[test]
    fn finalize_leaves_overlay_until_scroll() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(10.0, 10.0), true);
        m.pointer_move(p(50.0, 40.0));
        let fin = m.pointer_up(None);
        let Finalization::Capture { gesture, rect } = fin else {
            panic!("expected capture, got {:?}", fin);
        };
        assert_eq!(gesture, 1);
        assert_eq!((rect.width, rect.height), (40.0, 30.0));
        assert!(!m.is_dragging());
        assert!(m.overlay().visible);

        assert!(m.scroll());
        assert!(!m.overlay().visible);
        assert!(!m.scroll());
    }

    #[test]
    fn release_point_overrides_last_move() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(0.0, 0.0), true);
        m.pointer_move(p(5.0, 5.0));
        match m.pointer_up(Some(p(20.0, 10.0))) {
            Finalization::Capture { rect, .. } => assert_eq!((rect.width, rect.height), (20.0, 10.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn degenerate_release_hides_overlay() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(10.0, 10.0), true);
        m.pointer_move(p(10.0, 80.0));
        assert_eq!(m.pointer_up(None), Finalization::Degenerate { gesture: 1 });
        assert!(!m.overlay().visible);
        assert_eq!(m.pointer_up(None), Finalization::NotDragging);
    }

    #[test]
    fn scroll_while_dragging_keeps_gesture() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(10.0, 10.0), true);
        assert!(!m.scroll());
        assert!(m.is_dragging());
        let r = m.pointer_move(p(30.0, 30.0)).unwrap();
        assert_eq!((r.width, r.height), (20.0, 20.0));
    }

    #[test]
    fn second_down_during_drag_keeps_anchor() {
        let mut m = SelectionMachine::new();
        m.pointer_down(p(10.0, 10.0), true);
        assert!(m.pointer_down(p(90.0, 90.0), true).is_none());
        let r = m.pointer_move(p(20.0, 20.0)).unwrap();
        assert_eq!((r.left, r.top), (10.0, 10.0));
    }

    #[test]
    fn cancel_and_clear_if() {
        let mut m = SelectionMachine::new();
        assert!(!m.cancel());
        m.pointer_down(p(0.0, 0.0), true);
        assert!(m.cancel());
        assert!(!m.overlay().visible);

        m.pointer_down(p(0.0, 0.0), true);
        m.pointer_up(Some(p(10.0, 10.0)));
        // gesture 2 is showing; clearing gesture 1 must not hide it
        assert!(!m.clear_if(1));
        assert!(m.overlay().visible);
        assert!(m.clear_if(2));
        assert!(!m.overlay().visible);
    }
}
