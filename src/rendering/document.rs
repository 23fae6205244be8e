//! Flattened element tree for rendered content.
//!
//! The markup is parsed with `scraper` and flattened into an arena in
//! document order. Every node keeps its parent index so ancestor walks are a
//! simple loop, which is all the activation gate needs.

use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Index of an element in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    /// Direct text children only, whitespace-collapsed
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The content subtree, rooted at the content container (`<body>`)
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DomNode>,
}

impl Document {
    /// Parse raw markup. The content root is always `NodeId(0)`.
    pub fn parse(markup: &str) -> Result<Self> {
        let html = Html::parse_document(markup);
        let body_sel = Selector::parse("body")
            .map_err(|e| Error::ContentError(format!("invalid selector: {:?}", e)))?;
        let root = html
            .select(&body_sel)
            .next()
            .unwrap_or_else(|| html.root_element());

        let mut nodes: Vec<DomNode> = Vec::new();
        let mut stack: Vec<(ElementRef, Option<NodeId>)> = vec![(root, None)];
        while let Some((el, parent)) = stack.pop() {
            let idx = NodeId(nodes.len());
            let text = el
                .children()
                .filter_map(|n| n.value().as_text().map(|t| (&**t).to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            nodes.push(DomNode {
                tag: el.value().name().to_ascii_lowercase(),
                id: el.value().attr("id").map(str::to_string),
                class: el.value().attr("class").map(str::to_string),
                text: text.split_whitespace().collect::<Vec<_>>().join(" "),
                parent,
                children: Vec::new(),
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(idx);
            }

            // Reverse push keeps the traversal in document order.
            let children: Vec<_> = el.children().filter_map(ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DomNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// First element carrying the given `id` attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, n)| n.id.as_deref() == Some(id))
            .map(|(nid, _)| nid)
    }

    /// The node itself followed by each ancestor up to and including the content root.
    /// Unknown ids yield nothing.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).map(|_| id),
        }
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a DomNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.doc.node(id)?;
        self.next = node.parent;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="overlay-page1"><p>Hello <span id="s1">world</span></p></div>
        <p id="plain">Outside</p>
    </body></html>"#;

    #[test]
    fn parse_flattens_in_document_order() {
        let doc = Document::parse(PAGE).unwrap();
        let tags: Vec<_> = doc.iter().map(|(_, n)| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["body", "div", "p", "span", "p"]);
        let p = doc.node(NodeId(2)).unwrap();
        assert_eq!(p.text, "Hello");
        assert_eq!(p.children, vec![NodeId(3)]);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let doc = Document::parse(PAGE).unwrap();
        let span = doc.find_by_id("s1").unwrap();
        let chain: Vec<_> = doc.ancestors(span).map(|(_, n)| n.tag.clone()).collect();
        assert_eq!(chain, vec!["span", "p", "div", "body"]);
        assert_eq!(doc.ancestors(NodeId(99)).count(), 0);
    }

    #[test]
    fn fragments_get_a_body_root() {
        let doc = Document::parse("<span>bare</span>").unwrap();
        assert_eq!(doc.node(doc.root()).unwrap().tag, "body");
        assert_eq!(doc.len(), 2);
    }
}
