//! The microdata tree walk.
//!
//! One pre-order pass over the node tree. The walk threads the nearest
//! enclosing item ("current item") down to descendants on an explicit
//! stack, so document depth never turns into native stack depth.
//!
//! Scoping rules:
//! - a node with `itemprop` adds its resolved value to the current item
//!   under every listed name, and is never a top-level item itself;
//! - an `itemprop` outside any item is dropped;
//! - a node with `itemscope` and no `itemprop` starts a new top-level item,
//!   even inside another item's subtree;
//! - the children of a node that became an item are walked once, with that
//!   item as the current item.
//! - item-valued properties nest at most [`MAX_ITEM_DEPTH`] items deep;
//!   past that, the property takes the element's text and the subtree has
//!   no current item.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::error::Result;
use crate::item::{Item, ItemGraph, ItemId, SerializedItem, Value, split_tokens};
use crate::node::Node;

const ITEMSCOPE: &str = "itemscope";
const ITEMPROP: &str = "itemprop";
const ITEMTYPE: &str = "itemtype";
const ITEMID: &str = "itemid";

/// Deepest chain of item-valued properties the walk builds.
///
/// A nested item below this depth becomes the text of its element and its
/// subtree is walked with no current item. Three JSON nesting levels per
/// item keep output readable by `serde_json`'s default recursion limit.
pub const MAX_ITEM_DEPTH: usize = 32;

/// Extraction output: the serialized top-level items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Microdata {
    pub items: Vec<SerializedItem>,
}

impl Microdata {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Extracted items before serialization.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    graph: ItemGraph,
    top_level: Vec<ItemId>,
}

impl Extraction {
    /// Every item found, nested ones included.
    pub fn graph(&self) -> &ItemGraph {
        &self.graph
    }

    /// Items not attached to another item as a property value.
    pub fn top_level(&self) -> &[ItemId] {
        &self.top_level
    }

    pub fn serialize(&self) -> Microdata {
        Microdata {
            items: self.graph.serialize_many(&self.top_level),
        }
    }
}

/// Extract and serialize every microdata item under `root`.
pub fn extract<N: Node>(root: N, config: &Config) -> Microdata {
    extract_items(root, config).serialize()
}

/// Extract items under `root`, keeping them in their arena.
pub fn extract_items<N: Node>(root: N, config: &Config) -> Extraction {
    let mut walker = Walker::new(config);
    walker.walk(root);

    tracing::debug!(
        top_level = walker.top_level.len(),
        total = walker.graph.len(),
        "extracted microdata"
    );

    Extraction {
        graph: walker.graph,
        top_level: walker.top_level,
    }
}

/// Where a property node's value comes from, chosen by tag name.
///
/// Variants are listed in matching priority; `itemscope` beats the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// The node is itself an item.
    Item,
    /// A plain attribute, verbatim.
    Attr(&'static str),
    /// A URL attribute, resolved against the base.
    Url(&'static str),
    /// Descendant text content.
    Text,
}

impl ValueSource {
    pub fn classify<N: Node>(node: &N) -> Self {
        if node.has_attr(ITEMSCOPE) {
            return ValueSource::Item;
        }
        match node.tag_name().unwrap_or_default() {
            "meta" => ValueSource::Attr("content"),
            "audio" | "embed" | "iframe" | "img" | "source" | "track" | "video" => {
                ValueSource::Url("src")
            }
            "a" | "area" | "link" => ValueSource::Url("href"),
            "object" => ValueSource::Url("data"),
            "data" | "meter" => ValueSource::Attr("value"),
            "time" => ValueSource::Attr("datetime"),
            _ => ValueSource::Text,
        }
    }
}

enum Base {
    Absent,
    Valid(Url),
    Invalid,
}

impl Base {
    fn from_config(config: &Config) -> Self {
        let Some(raw) = config.base().filter(|b| !b.trim().is_empty()) else {
            return Base::Absent;
        };
        match Url::parse(raw) {
            Ok(url) => Base::Valid(url),
            Err(error) => {
                tracing::warn!(base = raw, %error, "unparsable base URL, URL values will be empty");
                Base::Invalid
            }
        }
    }

    fn resolve(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return String::new();
        };
        match self {
            Base::Absent => raw.to_string(),
            Base::Valid(base) => base.join(raw).map(String::from).unwrap_or_default(),
            Base::Invalid => String::new(),
        }
    }
}

struct Walker {
    base: Base,
    graph: ItemGraph,
    top_level: Vec<ItemId>,
}

impl Walker {
    fn new(config: &Config) -> Self {
        Self {
            base: Base::from_config(config),
            graph: ItemGraph::new(),
            top_level: Vec::new(),
        }
    }

    fn walk<N: Node>(&mut self, root: N) {
        // Frames carry the current item and its nesting depth (top-level is 1).
        let mut stack: Vec<(N, Option<ItemId>, usize)> = vec![(root, None, 0)];
        let mut children: Vec<N> = Vec::new();

        while let Some((node, current, depth)) = stack.pop() {
            let names = node.attr(ITEMPROP).map(split_tokens).unwrap_or_default();
            let mut scope = current;
            let mut scope_depth = depth;

            if !names.is_empty() {
                if let Some(parent) = current {
                    let value = match ValueSource::classify(&node) {
                        ValueSource::Item if depth < MAX_ITEM_DEPTH => {
                            let id = self.new_item(&node);
                            scope = Some(id);
                            scope_depth = depth + 1;
                            Value::Item(id)
                        }
                        ValueSource::Item => {
                            tracing::warn!(
                                ?names,
                                max_depth = MAX_ITEM_DEPTH,
                                "items nested too deeply, property kept as text"
                            );
                            scope = None;
                            scope_depth = 0;
                            Value::Text(self.resolve(&node, ValueSource::Item))
                        }
                        source => Value::Text(self.resolve(&node, source)),
                    };
                    if let Some(item) = self.graph.get_mut(parent) {
                        for name in names {
                            item.add_property(name, value.clone());
                        }
                    }
                } else {
                    tracing::trace!(?names, "itemprop outside any item, dropped");
                }
            } else if node.has_attr(ITEMSCOPE) {
                let id = self.new_item(&node);
                self.top_level.push(id);
                scope = Some(id);
                scope_depth = 1;
            }

            children.extend(node.children());
            stack.extend(
                children
                    .drain(..)
                    .rev()
                    .map(|child| (child, scope, scope_depth)),
            );
        }
    }

    fn new_item<N: Node>(&mut self, node: &N) -> ItemId {
        self.graph
            .insert(Item::new(node.attr(ITEMTYPE), node.attr(ITEMID)))
    }

    fn resolve<N: Node>(&self, node: &N, source: ValueSource) -> String {
        match source {
            ValueSource::Attr(name) => node.attr(name).unwrap_or_default().to_string(),
            ValueSource::Url(name) => self.base.resolve(node.attr(name)),
            // An item past the depth limit falls back to its text.
            ValueSource::Text | ValueSource::Item => node.text(),
        }
    }
}
