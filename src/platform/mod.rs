//! Host side-channels: the cursor and the viewport metrics.
//!
//! The selection core never touches a real window. Everything it needs from
//! the host goes through these traits, so headless hosts and tests can supply
//! in-memory implementations.

pub mod cursor;
pub mod viewport;

pub use cursor::{CursorSink, CursorStyle, RecordingCursor};
pub use viewport::{HeadlessViewport, ScrollMetrics, ViewportMetrics};

use std::sync::Arc;

/// Composite access to the host surfaces a [`crate::Snipper`] consumes.
pub trait PlatformApi: Send + Sync {
    fn cursor(&self) -> Arc<dyn CursorSink>;
    fn viewport(&self) -> Arc<dyn ViewportMetrics>;
}

/// In-memory platform used by the CLI and tests.
///
/// The concrete handles stay reachable so callers can scroll, unmount or
/// inspect cursor history while a snipper holds the trait objects.
#[derive(Clone)]
pub struct HeadlessPlatform {
    pub cursor: Arc<RecordingCursor>,
    pub viewport: Arc<HeadlessViewport>,
}

impl HeadlessPlatform {
    pub fn new(document_width: u32, document_height: u32) -> Self {
        HeadlessPlatform {
            cursor: Arc::new(RecordingCursor::new()),
            viewport: Arc::new(HeadlessViewport::new(document_width, document_height)),
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl PlatformApi for HeadlessPlatform {
    fn cursor(&self) -> Arc<dyn CursorSink> {
        self.cursor.clone()
    }

    fn viewport(&self) -> Arc<dyn ViewportMetrics> {
        self.viewport.clone()
    }
}
