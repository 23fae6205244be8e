/// Scroll offset and document extents as seen by the capture step

use crate::{Error, Result, Viewport};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// One consistent reading of scroll position and document size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollMetrics {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub document_width: u32,
    pub document_height: u32,
}

pub trait ViewportMetrics: Send + Sync {
    /// Read scroll and extents together. Fails once the content is gone.
    fn read(&self) -> Result<ScrollMetrics>;

    /// Told once the content has been rendered. Hosts that measure the live
    /// document themselves can ignore it.
    fn content_rendered(&self, _window: Viewport, _extents: (u32, u32)) {}
}

#[derive(Debug)]
struct ViewportState {
    metrics: ScrollMetrics,
    window: Viewport,
    mounted: bool,
}

impl ViewportState {
    /// Keep scroll within `[0, document - window]` on both axes.
    fn clamp_scroll(&mut self) {
        let max_x = self.metrics.document_width.saturating_sub(self.window.width) as f64;
        let max_y = self.metrics.document_height.saturating_sub(self.window.height) as f64;
        self.metrics.scroll_x = self.metrics.scroll_x.clamp(0.0, max_x);
        self.metrics.scroll_y = self.metrics.scroll_y.clamp(0.0, max_y);
    }
}

/// Mutex-backed viewport used by headless hosts and tests.
///
/// The window defaults to 1280x720. Scroll offsets are clamped so the window
/// never leaves the document.
pub struct HeadlessViewport {
    state: Mutex<ViewportState>,
}

impl HeadlessViewport {
    pub fn new(document_width: u32, document_height: u32) -> Self {
        HeadlessViewport {
            state: Mutex::new(ViewportState {
                metrics: ScrollMetrics {
                    scroll_x: 0.0,
                    scroll_y: 0.0,
                    document_width,
                    document_height,
                },
                window: Viewport::default(),
                mounted: true,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ViewportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut g = self.lock();
        g.metrics.scroll_x = if x.is_nan() { 0.0 } else { x };
        g.metrics.scroll_y = if y.is_nan() { 0.0 } else { y };
        g.clamp_scroll();
    }

    pub fn set_extents(&self, width: u32, height: u32) {
        let mut g = self.lock();
        g.metrics.document_width = width;
        g.metrics.document_height = height;
        g.clamp_scroll();
    }

    /// Simulate the content container going away
    pub fn unmount(&self) {
        self.lock().mounted = false;
    }

    pub fn mount(&self) {
        self.lock().mounted = true;
    }
}

impl Default for HeadlessViewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl ViewportMetrics for HeadlessViewport {
    fn read(&self) -> Result<ScrollMetrics> {
        let g = self.lock();
        if !g.mounted {
            return Err(Error::MetricsUnavailable("content container is unmounted".into()));
        }
        Ok(g.metrics)
    }

    fn content_rendered(&self, window: Viewport, (width, height): (u32, u32)) {
        let mut g = self.lock();
        g.window = window;
        g.metrics.document_width = width;
        g.metrics.document_height = height;
        g.clamp_scroll();
    }
}
