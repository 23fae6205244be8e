//! Activation gate: decides what a pointer event is aimed at.
//!
//! Classification walks from the event target up to the content root and
//! looks for an element whose id starts with the activation prefix. The
//! result drives two separate things: the hover cursor, and whether a
//! pointer-down may start a selection gesture.

use crate::platform::{CursorSink, CursorStyle};
use crate::rendering::document::{Document, NodeId};
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTarget {
    /// Inside an activation region; may start a gesture
    SelectionSurface,
    /// An annotated span outside any activation region; hover affordance only
    AnnotatedSpan,
    Plain,
}

impl ActivationTarget {
    pub fn cursor(self) -> CursorStyle {
        match self {
            ActivationTarget::SelectionSurface => CursorStyle::Crosshair,
            ActivationTarget::AnnotatedSpan => CursorStyle::Pointer,
            ActivationTarget::Plain => CursorStyle::Default,
        }
    }

    pub fn starts_gesture(self) -> bool {
        self == ActivationTarget::SelectionSurface
    }
}

/// Naming conventions the gate matches against
#[derive(Debug, Clone)]
pub struct ActivationGate {
    prefix: String,
    annotated_tag: String,
}

impl ActivationGate {
    pub fn new(prefix: impl Into<String>, annotated_tag: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            annotated_tag: annotated_tag.into().to_ascii_lowercase(),
        }
    }

    /// Closest activation region enclosing `target`, if any
    pub fn activation_region(&self, doc: &Document, target: NodeId) -> Option<NodeId> {
        doc.ancestors(target)
            .find(|(_, n)| n.id.as_deref().is_some_and(|id| id.starts_with(&self.prefix)))
            .map(|(id, _)| id)
    }

    /// Classify an event target. `None` (events outside the content) is `Plain`.
    pub fn classify(&self, doc: &Document, target: Option<NodeId>) -> ActivationTarget {
        let Some(target) = target else {
            return ActivationTarget::Plain;
        };
        if self.activation_region(doc, target).is_some() {
            return ActivationTarget::SelectionSurface;
        }
        match doc.node(target) {
            Some(n) if n.tag == self.annotated_tag => ActivationTarget::AnnotatedSpan,
            _ => ActivationTarget::Plain,
        }
    }
}

impl Default for ActivationGate {
    fn default() -> Self {
        Self::new("overlay", "span")
    }
}

/// The one place the global cursor is written from.
///
/// Writes are skipped when the style would not change, and [`reset`] always
/// returns the cursor to the default.
///
/// [`reset`]: HoverAffordance::reset
pub struct HoverAffordance {
    sink: Arc<dyn CursorSink>,
    current: CursorStyle,
}

impl HoverAffordance {
    pub fn new(sink: Arc<dyn CursorSink>) -> Self {
        let current = sink.cursor();
        Self { sink, current }
    }

    pub fn set(&mut self, style: CursorStyle) {
        if style != self.current {
            debug!("cursor -> {}", style.css_keyword());
            self.sink.set_cursor(style);
            self.current = style;
        }
    }

    pub fn reset(&mut self) {
        self.set(CursorStyle::Default);
    }

    pub fn current(&self) -> CursorStyle {
        self.current
    }
}
