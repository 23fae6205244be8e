//! Rendering collaborator: markup in, laid-out and paintable content out.

pub mod document;
pub mod layout;
pub mod paint;
#[cfg(feature = "raster")]
pub mod raster;

use crate::geometry::PointerPoint;
use crate::{Result, SnipConfig};
use document::{Document, NodeId};
use layout::{layout_document, Layout};
use paint::{build_display_list, PaintCommand};
use std::sync::Arc;

/// Rendered content: the parsed tree, its layout and its display list.
#[derive(Debug, Clone)]
pub struct ContentHost {
    document: Document,
    layout: Layout,
    display_list: Arc<Vec<PaintCommand>>,
}

impl ContentHost {
    /// Render `config.content` at `config.scale` into `config.viewport`.
    pub fn render(config: &SnipConfig) -> Result<Self> {
        let document = Document::parse(&config.content)?;
        let layout = layout_document(&document, config.viewport, config.scale);
        let display_list = Arc::new(build_display_list(&document, &layout, &config.highlight_ids));
        log::debug!(
            "rendered {} elements, extents {}x{}",
            document.len(),
            layout.extents.0,
            layout.extents.1
        );
        Ok(Self {
            document,
            layout,
            display_list,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn display_list(&self) -> &[PaintCommand] {
        &self.display_list
    }

    /// Full document width and height in CSS pixels
    pub fn extents(&self) -> (u32, u32) {
        self.layout.extents
    }

    /// Element under a viewport point, given the current scroll offset
    pub fn hit_test(&self, point: PointerPoint, scroll_x: f64, scroll_y: f64) -> Option<NodeId> {
        self.layout.hit_test(point.x + scroll_x, point.y + scroll_y)
    }

    /// A rasterizer painting this content's display list
    #[cfg(feature = "raster")]
    pub fn rasterizer(&self) -> raster::PaintRasterizer {
        raster::PaintRasterizer::new(self.display_list.clone())
    }
}
