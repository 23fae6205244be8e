/// Pointer cursor side-channel used for hover affordances

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Over an activation region
    Crosshair,
    /// Over an annotated span
    Pointer,
}

impl CursorStyle {
    /// CSS keyword for hosts that forward the style to a real document
    pub fn css_keyword(self) -> &'static str {
        match self {
            CursorStyle::Default => "auto",
            CursorStyle::Crosshair => "crosshair",
            CursorStyle::Pointer => "pointer",
        }
    }
}

/// The single global cursor setter
pub trait CursorSink: Send + Sync {
    fn set_cursor(&self, style: CursorStyle);
    fn cursor(&self) -> CursorStyle;
}

/// In-memory cursor that remembers every style it was given
#[derive(Default)]
pub struct RecordingCursor {
    history: Mutex<Vec<CursorStyle>>,
}

impl RecordingCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<CursorStyle> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CursorSink for RecordingCursor {
    fn set_cursor(&self, style: CursorStyle) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(style);
    }

    fn cursor(&self) -> CursorStyle {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_cursor_tracks_latest_style() {
        let c = RecordingCursor::new();
        assert_eq!(c.cursor(), CursorStyle::Default);
        c.set_cursor(CursorStyle::Crosshair);
        c.set_cursor(CursorStyle::Pointer);
        assert_eq!(c.cursor(), CursorStyle::Pointer);
        assert_eq!(c.history().len(), 2);
        assert_eq!(CursorStyle::Crosshair.css_keyword(), "crosshair");
    }
}
