/// Display list construction from a layout

use crate::rendering::document::Document;
use crate::rendering::layout::Layout;
use std::collections::HashSet;

pub const BACKGROUND: (u8, u8, u8, u8) = (255, 255, 255, 255);
pub const HIGHLIGHT: (u8, u8, u8, u8) = (255, 230, 0, 110);
pub const INK: (u8, u8, u8, u8) = (0, 0, 0, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        /// Glyph cell edge in document pixels
        size: u32,
    },
}

/// Paint order: background, highlights, then text on top.
pub fn build_display_list(
    doc: &Document,
    layout: &Layout,
    highlight_ids: &HashSet<String>,
) -> Vec<PaintCommand> {
    let (w, h) = layout.extents;
    let mut cmds = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: w,
        height: h,
        rgba: BACKGROUND,
    }];

    for n in &layout.nodes {
        let highlighted = doc
            .node(n.node)
            .and_then(|d| d.id.as_ref())
            .is_some_and(|id| highlight_ids.contains(id));
        if highlighted {
            let r = n.lb.rect;
            cmds.push(PaintCommand::SolidRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                rgba: HIGHLIGHT,
            });
        }
    }

    for n in &layout.nodes {
        let pad = n.lb.box_model.padding as i32;
        let line_step = (n.glyph as f32 * 1.25).round() as i32;
        for (i, line) in n.lines.iter().enumerate() {
            cmds.push(PaintCommand::Text {
                x: n.lb.rect.x + pad,
                y: n.lb.rect.y + pad + i as i32 * line_step,
                text: line.clone(),
                size: n.glyph,
            });
        }
    }

    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_document;
    use crate::Viewport;

    #[test]
    fn highlights_paint_between_background_and_text() {
        let doc = Document::parse("<div id=\"h\"><p>hi</p></div><p id=\"n\">no</p>").unwrap();
        let layout = layout_document(&doc, Viewport { width: 100, height: 100 }, 1.0);
        let ids: HashSet<String> = ["h".to_string()].into_iter().collect();
        let cmds = build_display_list(&doc, &layout, &ids);

        match &cmds[0] {
            PaintCommand::SolidRect { rgba, .. } => assert_eq!(*rgba, BACKGROUND),
            other => panic!("unexpected first command {:?}", other),
        }
        let highlights = cmds
            .iter()
            .filter(|c| matches!(c, PaintCommand::SolidRect { rgba, .. } if *rgba == HIGHLIGHT))
            .count();
        assert_eq!(highlights, 1);
        assert!(matches!(cmds.last(), Some(PaintCommand::Text { .. })));
        let texts: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["hi", "no"]);
    }
}
