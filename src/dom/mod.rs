//! HTML front end: html5ever parsing into an arena DOM.
//!
//! [`Document`] owns the parsed tree and hands out [`NodeRef`]s, which
//! implement [`Node`] for the extractor and can be matched against CSS
//! selectors.
//!
//! # Example
//!
//! ```
//! use microdata::dom::Document;
//! use microdata::{extract, Config};
//!
//! let doc = Document::parse(
//!     r#"<aside><p itemscope><b itemprop="x">1</b></p></aside>
//!        <main><p itemscope><b itemprop="x">2</b></p></main>"#,
//! );
//! let main = doc.select("main").unwrap()[0];
//! let data = extract(main, &Config::default());
//! assert_eq!(data.items.len(), 1);
//! ```

mod arena;
mod element_ref;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use element_ref::{DomSelectors, ElementRef, Selector};
pub use tree_sink::ArenaSink;

use std::fmt;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::error::Result;
use crate::node::Node;

/// Parse an HTML document into an [`ArenaDom`].
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_dom()
}

/// A parsed HTML document.
pub struct Document {
    dom: ArenaDom,
}

impl Document {
    /// Parse an HTML string. Never fails; malformed markup is repaired the
    /// way browsers repair it.
    pub fn parse(html: &str) -> Self {
        Self {
            dom: parse_html(html),
        }
    }

    /// Parse HTML bytes, decoding them as UTF-8, the `<meta charset>`
    /// encoding, or Windows-1252, in that order of preference.
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        let hint = crate::util::sniff_meta_charset(bytes);
        Self::parse(&crate::util::decode_text(bytes, hint))
    }

    /// The document node.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(&self.dom, self.dom.document())
    }

    /// The underlying arena.
    pub fn dom(&self) -> &ArenaDom {
        &self.dom
    }

    /// Elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef<'_>>> {
        Ok(self.select_with(&Selector::parse(selector)?))
    }

    /// Elements matching a pre-parsed selector, in document order.
    pub fn select_with(&self, selector: &Selector) -> Vec<NodeRef<'_>> {
        selector
            .select(&self.dom, self.dom.document())
            .into_iter()
            .map(|id| NodeRef::new(&self.dom, id))
            .collect()
    }

    /// Like [`Document::select`], but drops matches nested inside an
    /// earlier match, so extracting from each result never visits a node
    /// twice.
    pub fn select_outermost(&self, selector: &str) -> Result<Vec<NodeRef<'_>>> {
        let matches = self.select(selector)?;
        let mut outermost: Vec<NodeRef<'_>> = Vec::with_capacity(matches.len());
        for node in matches {
            // Document order means a containing match is always the last kept one.
            if outermost.last().is_some_and(|last| last.contains(&node)) {
                continue;
            }
            outermost.push(node);
        }
        Ok(outermost)
    }
}

/// A node inside a [`Document`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a ArenaDom,
    id: ArenaNodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(dom: &'a ArenaDom, id: ArenaNodeId) -> Self {
        Self { dom, id }
    }

    pub fn id(&self) -> ArenaNodeId {
        self.id
    }

    /// Whether this node matches `selector`.
    pub fn is(&self, selector: &Selector) -> bool {
        selector.matches(self.dom, self.id)
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &NodeRef<'_>) -> bool {
        let mut cursor = other.id;
        while cursor.is_some() {
            if cursor == self.id {
                return true;
            }
            cursor = self
                .dom
                .get(cursor)
                .map(|n| n.parent)
                .unwrap_or(ArenaNodeId::NONE);
        }
        false
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.dom.element_name(self.id))
            .finish()
    }
}

impl<'a> Node for NodeRef<'a> {
    fn tag_name(&self) -> Option<&str> {
        self.dom.element_name(self.id).map(|n| n.as_ref())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.dom.get_attr(self.id, name)
    }

    fn children(&self) -> impl Iterator<Item = Self> {
        let dom = self.dom;
        dom.children(self.id).map(move |id| NodeRef::new(dom, id))
    }

    fn text(&self) -> String {
        self.dom.deep_text(self.id)
    }
}
