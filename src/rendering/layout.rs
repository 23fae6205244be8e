/// Block layout for rendered content.
///
/// Every element is laid out as a block: its own text wraps at a fixed 8px
/// glyph cell, then its children stack vertically underneath. Geometry is
/// computed at scale 1 and multiplied by the content scale factor at the end.

use crate::rendering::document::{Document, NodeId};
use crate::Viewport;

pub const GLYPH_SIZE: u32 = 8;
pub const LINE_HEIGHT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x as f64
            && y >= self.y as f64
            && x < self.x as f64 + self.width as f64
            && y < self.y as f64 + self.height as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxModel {
    pub margin: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        self.rect.width.saturating_sub(self.box_model.padding * 2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub node: NodeId,
    pub depth: usize,
    pub lb: LayoutBox,
    /// Wrapped text lines, painted from the top-left of the content box
    pub lines: Vec<String>,
    /// Glyph cell edge in document pixels (already scaled)
    pub glyph: u32,
}

/// Result of laying out a document
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Boxes in document order (parents before children)
    pub nodes: Vec<LayoutNode>,
    /// Full document width/height in CSS pixels, never smaller than the viewport
    pub extents: (u32, u32),
}

impl Layout {
    /// Deepest box containing a document-space point
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.lb.rect.contains(x, y))
            .max_by_key(|n| n.depth)
            .map(|n| n.node)
    }

    pub fn find(&self, node: NodeId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.node == node)
    }
}

fn wrap_text(text: &str, width: u32) -> Vec<String> {
    let chars_per_line = ((width / GLYPH_SIZE) as usize).max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.len() + word.len() + 1 > chars_per_line && !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

fn box_model(depth: usize) -> BoxModel {
    if depth == 0 {
        BoxModel { margin: 0, padding: 8 }
    } else {
        BoxModel { margin: 4, padding: 6 }
    }
}

/// Lay out every node of `doc` at scale 1, returning the boxes and the root height.
///
/// The arena is in document order, so parents always precede their children.
/// Widths flow down in a forward pass, heights come back up in a reverse pass,
/// and a final forward pass stacks children at their offsets. No recursion,
/// so nesting depth is bounded by memory rather than the thread stack.
fn block_layout(doc: &Document, width: u32) -> (Vec<LayoutNode>, u32) {
    let mut out: Vec<LayoutNode> = Vec::with_capacity(doc.len());
    for (id, node) in doc.iter() {
        let (depth, outer) = match node.parent.and_then(|p| out.get(p.index())) {
            Some(parent) => (parent.depth + 1, parent.lb.content_width()),
            None => (0, width),
        };
        let box_model = box_model(depth);
        let lines = wrap_text(&node.text, outer.saturating_sub(box_model.padding * 2));
        out.push(LayoutNode {
            node: id,
            depth,
            lb: LayoutBox {
                rect: Rect { x: 0, y: 0, width: outer, height: 0 },
                box_model,
            },
            lines,
            glyph: GLYPH_SIZE,
        });
    }

    for i in (0..out.len()).rev() {
        let Some(node) = doc.node(out[i].node) else {
            continue;
        };
        let padding = out[i].lb.box_model.padding;
        let children: u32 = node
            .children
            .iter()
            .filter_map(|c| out.get(c.index()))
            .map(|c| c.lb.rect.height + c.lb.box_model.margin)
            .sum();
        out[i].lb.rect.height = padding * 2 + out[i].lines.len() as u32 * LINE_HEIGHT + children;
    }

    for i in 0..out.len() {
        let Some(node) = doc.node(out[i].node) else {
            continue;
        };
        let Rect { x, y, .. } = out[i].lb.rect;
        let padding = out[i].lb.box_model.padding;
        let mut cursor = padding + out[i].lines.len() as u32 * LINE_HEIGHT;
        for child in &node.children {
            let Some(c) = out.get_mut(child.index()) else {
                continue;
            };
            c.lb.rect.x = x + padding as i32;
            c.lb.rect.y = y + cursor as i32;
            cursor += c.lb.rect.height + c.lb.box_model.margin;
        }
    }

    let root_height = out.first().map_or(0, |n| n.lb.rect.height);
    (out, root_height)
}

fn scale_u32(v: u32, scale: f32) -> u32 {
    (v as f32 * scale).round() as u32
}

fn scale_i32(v: i32, scale: f32) -> i32 {
    (v as f32 * scale).round() as i32
}

/// Compute the block layout for a document rendered into `viewport` at `scale`.
pub fn layout_document(doc: &Document, viewport: Viewport, scale: f32) -> Layout {
    let (mut nodes, content_h) = block_layout(doc, viewport.width);
    for n in &mut nodes {
        let r = &mut n.lb.rect;
        r.x = scale_i32(r.x, scale);
        r.y = scale_i32(r.y, scale);
        r.width = scale_u32(r.width, scale);
        r.height = scale_u32(r.height, scale);
        n.lb.box_model.margin = scale_u32(n.lb.box_model.margin, scale);
        n.lb.box_model.padding = scale_u32(n.lb.box_model.padding, scale);
        n.glyph = scale_u32(GLYPH_SIZE, scale).max(1);
    }

    let extents = (
        scale_u32(viewport.width, scale).max(viewport.width),
        scale_u32(content_h, scale).max(viewport.height),
    );
    Layout { nodes, extents }
}
