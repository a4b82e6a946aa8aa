//! The extracted item model.
//!
//! Items live in an [`ItemGraph`] arena and refer to nested items by
//! [`ItemId`]. A node declaring several property names (`itemprop="a b"`)
//! resolves to one nested item, so the same id is stored under each name.
//!
//! [`SerializedItem`] is the plain output shape: strings, sequences and
//! ordered maps only, ready for serde.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Split a whitespace-separated token list, dropping empty tokens and
/// duplicates while keeping first-seen order.
pub fn split_tokens(value: &str) -> Vec<String> {
    value.split_whitespace()
        .collect::<IndexSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Index of an item in an [`ItemGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// A property value: literal text or a nested item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Item(ItemId),
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<ItemId> for Value {
    fn from(id: ItemId) -> Self {
        Value::Item(id)
    }
}

/// One microdata item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    types: Option<Vec<String>>,
    id: Option<String>,
    properties: IndexMap<String, Vec<Value>>,
}

impl Item {
    /// Build an item from raw `itemtype` and `itemid` attribute values.
    ///
    /// Blank or missing values leave the corresponding field absent.
    pub fn new(itemtype: Option<&str>, itemid: Option<&str>) -> Self {
        let types = itemtype.map(split_tokens).filter(|t| !t.is_empty());
        let id = itemid
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            types,
            id,
            properties: IndexMap::new(),
        }
    }

    /// Append `value` under `name`. Repeated values are kept.
    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// The de-duplicated `itemtype` tokens.
    pub fn types(&self) -> Option<&[String]> {
        self.types.as_deref()
    }

    /// The trimmed `itemid`.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Properties in first-insertion order of their names.
    pub fn properties(&self) -> &IndexMap<String, Vec<Value>> {
        &self.properties
    }

    /// Values recorded under `name`, empty if none.
    pub fn property(&self, name: &str) -> &[Value] {
        self.properties.get(name).map_or(&[], Vec::as_slice)
    }

    fn nested(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.properties.values().flatten().filter_map(|v| match v {
            Value::Item(id) => Some(*id),
            Value::Text(_) => None,
        })
    }
}

/// Arena owning every item of one extraction.
#[derive(Debug, Clone, Default)]
pub struct ItemGraph {
    items: Vec<Item>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Placeholder for an item that (directly or indirectly) contains itself.
const CYCLE_MARKER: &str = "ERROR";

impl ItemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `item` into the arena.
    pub fn insert(&mut self, item: Item) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.items.push(item);
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize one item and everything it nests.
    pub fn serialize(&self, id: ItemId) -> Option<SerializedItem> {
        self.serialize_many(&[id]).pop()
    }

    /// Serialize several items, in the order given.
    ///
    /// Works bottom-up over an explicit post-order, so deeply nested items
    /// do not recurse. An item referenced under several names is serialized
    /// once and copied into each slot. Unknown ids are skipped.
    ///
    /// The output depth follows the graph. Graphs built by the walk stay
    /// within [`MAX_ITEM_DEPTH`](crate::extract::MAX_ITEM_DEPTH).
    pub fn serialize_many(&self, roots: &[ItemId]) -> Vec<SerializedItem> {
        let n = self.items.len();
        let mut state = vec![Visit::Unvisited; n];
        let mut refs = vec![0usize; n];
        let mut order = Vec::new();
        let mut stack: Vec<(ItemId, bool)> = Vec::new();

        for &root in roots.iter().rev() {
            if self.get(root).is_some() {
                refs[root.0 as usize] += 1;
                stack.push((root, false));
            }
        }

        while let Some((id, expanded)) = stack.pop() {
            let idx = id.0 as usize;
            if expanded {
                state[idx] = Visit::Done;
                order.push(id);
                continue;
            }
            if state[idx] != Visit::Unvisited {
                continue;
            }
            state[idx] = Visit::InProgress;
            stack.push((id, true));
            for child in self.items[idx].nested() {
                let Some(slot) = refs.get_mut(child.0 as usize) else {
                    continue;
                };
                *slot += 1;
                if state[child.0 as usize] == Visit::Unvisited {
                    stack.push((child, false));
                }
            }
        }

        let mut done: Vec<Option<SerializedItem>> = (0..n).map(|_| None).collect();
        let mut take = |done: &mut Vec<Option<SerializedItem>>, id: ItemId| {
            let idx = id.0 as usize;
            refs[idx] = refs[idx].saturating_sub(1);
            if refs[idx] == 0 {
                done[idx].take()
            } else {
                done[idx].clone()
            }
        };

        for id in order {
            let item = &self.items[id.0 as usize];
            let mut properties = IndexMap::with_capacity(item.properties.len());
            for (name, values) in &item.properties {
                let serialized = values
                    .iter()
                    .filter_map(|value| match value {
                        Value::Text(s) => Some(SerializedValue::Text(s.clone())),
                        Value::Item(child) if self.get(*child).is_none() => None,
                        Value::Item(child) => Some(match take(&mut done, *child) {
                            Some(nested) => SerializedValue::Item(nested),
                            None => SerializedValue::Text(CYCLE_MARKER.to_string()),
                        }),
                    })
                    .collect();
                properties.insert(name.clone(), serialized);
            }
            done[id.0 as usize] = Some(SerializedItem {
                types: item.types.clone(),
                id: item.id.clone(),
                properties,
            });
        }

        roots
            .iter()
            .filter(|root| self.get(**root).is_some())
            .filter_map(|&root| take(&mut done, root))
            .collect()
    }
}

/// Plain serialized form of an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub properties: IndexMap<String, Vec<SerializedValue>>,
}

// Nested items are detached onto a worklist so dropping a deep chain does
// not recurse.
impl Drop for SerializedItem {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_nested(&mut self.properties, &mut pending);
        while let Some(mut item) = pending.pop() {
            detach_nested(&mut item.properties, &mut pending);
        }
    }
}

fn detach_nested(
    properties: &mut IndexMap<String, Vec<SerializedValue>>,
    pending: &mut Vec<SerializedItem>,
) {
    for values in properties.values_mut() {
        pending.extend(values.drain(..).filter_map(|value| match value {
            SerializedValue::Item(item) => Some(item),
            SerializedValue::Text(_) => None,
        }));
    }
}

/// A serialized property value: a string or a nested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedValue {
    Text(String),
    Item(SerializedItem),
}

impl SerializedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SerializedValue::Text(s) => Some(s),
            SerializedValue::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&SerializedItem> {
        match self {
            SerializedValue::Item(item) => Some(item),
            SerializedValue::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_splits_and_dedups_types() {
        let item = Item::new(Some("Foo   Foo Bar"), None);
        assert_eq!(
            item.types(),
            Some(&["Foo".to_string(), "Bar".to_string()][..])
        );
    }

    #[test]
    fn test_new_blank_fields_are_absent() {
        let item = Item::new(Some("   "), Some(" \t\n"));
        assert_eq!(item.types(), None);
        assert_eq!(item.id(), None);
        assert!(item.properties().is_empty());

        let item = Item::new(None, None);
        assert_eq!(item.types(), None);
        assert_eq!(item.id(), None);
    }

    #[test]
    fn test_new_trims_id() {
        let item = Item::new(None, Some("  urn:isbn:0-330-34032-8 "));
        assert_eq!(item.id(), Some("urn:isbn:0-330-34032-8"));
    }

    #[test]
    fn test_add_property_keeps_duplicates_in_order() {
        let mut item = Item::new(None, None);
        item.add_property("tag", "a");
        item.add_property("name", "x");
        item.add_property("tag", "a");

        assert_eq!(item.property("tag"), &[Value::from("a"), Value::from("a")]);
        let names: Vec<_> = item.properties().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["tag", "name"]);
        assert!(item.property("missing").is_empty());
    }

    #[test]
    fn test_serialize_nested() {
        let mut graph = ItemGraph::new();
        let outer = graph.insert(Item::new(Some("Book"), None));
        let author = graph.insert(Item::new(Some("Person"), Some("p1")));
        graph.get_mut(author).unwrap().add_property("name", "Ann");
        graph.get_mut(outer).unwrap().add_property("title", "Tales");
        graph.get_mut(outer).unwrap().add_property("author", author);

        let out = graph.serialize(outer).unwrap();
        assert_eq!(out.types, Some(vec!["Book".to_string()]));
        assert_eq!(out.id, None);
        assert_eq!(out.properties["title"][0].as_text(), Some("Tales"));

        let nested = out.properties["author"][0].as_item().unwrap();
        assert_eq!(nested.id.as_deref(), Some("p1"));
        assert_eq!(nested.properties["name"][0].as_text(), Some("Ann"));
    }

    #[test]
    fn test_serialize_shared_item_under_several_names() {
        let mut graph = ItemGraph::new();
        let outer = graph.insert(Item::new(None, None));
        let shared = graph.insert(Item::new(Some("Person"), None));
        graph.get_mut(shared).unwrap().add_property("name", "Ann");
        graph.get_mut(outer).unwrap().add_property("author", shared);
        graph.get_mut(outer).unwrap().add_property("editor", shared);

        let out = graph.serialize(outer).unwrap();
        assert_eq!(out.properties["author"], out.properties["editor"]);
        assert!(out.properties["author"][0].as_item().is_some());
    }

    #[test]
    fn test_serialize_is_repeatable() {
        let mut graph = ItemGraph::new();
        let outer = graph.insert(Item::new(Some("A B"), Some("x")));
        let inner = graph.insert(Item::new(None, None));
        graph.get_mut(outer).unwrap().add_property("p", inner);
        graph.get_mut(outer).unwrap().add_property("q", "text");

        let first = graph.serialize_many(&[outer]);
        let second = graph.serialize_many(&[outer]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialize_children_inserted_before_parent() {
        let mut graph = ItemGraph::new();
        let child = graph.insert(Item::new(Some("Child"), None));
        let parent = graph.insert(Item::new(Some("Parent"), None));
        graph.get_mut(parent).unwrap().add_property("kid", child);

        let out = graph.serialize(parent).unwrap();
        let kid = out.properties["kid"][0].as_item().unwrap();
        assert_eq!(kid.types, Some(vec!["Child".to_string()]));
    }

    #[test]
    fn test_serialize_cycle_terminates() {
        let mut graph = ItemGraph::new();
        let a = graph.insert(Item::new(None, None));
        let b = graph.insert(Item::new(None, None));
        graph.get_mut(a).unwrap().add_property("next", b);
        graph.get_mut(b).unwrap().add_property("back", a);

        let out = graph.serialize(a).unwrap();
        let b_out = out.properties["next"][0].as_item().unwrap();
        assert_eq!(b_out.properties["back"][0].as_text(), Some("ERROR"));
    }

    #[test]
    fn test_serialize_unknown_id() {
        let graph = ItemGraph::new();
        assert!(graph.serialize(ItemId(3)).is_none());
    }

    #[test]
    fn test_serialized_json_shape() {
        let mut graph = ItemGraph::new();
        let id = graph.insert(Item::new(None, None));
        graph.get_mut(id).unwrap().add_property("b", "1");
        graph.get_mut(id).unwrap().add_property("a", "2");

        let json = serde_json::to_string(&graph.serialize(id).unwrap()).unwrap();
        assert_eq!(json, r#"{"properties":{"b":["1"],"a":["2"]}}"#);

        let typed = graph.insert(Item::new(Some("T"), Some("i")));
        let json = serde_json::to_string(&graph.serialize(typed).unwrap()).unwrap();
        assert_eq!(json, r#"{"type":["T"],"id":"i","properties":{}}"#);
    }

    #[test]
    fn test_drop_deep_serialized_chain() {
        let mut item = SerializedItem {
            types: None,
            id: None,
            properties: IndexMap::new(),
        };
        for _ in 0..200_000 {
            let mut properties = IndexMap::new();
            properties.insert("x".to_string(), vec![SerializedValue::Item(item)]);
            item = SerializedItem {
                types: None,
                id: None,
                properties,
            };
        }
        drop(item);
    }

    proptest! {
        #[test]
        fn prop_split_tokens_unique_nonempty(input in "[ a-c\\t\\n]{0,24}") {
            let tokens = split_tokens(&input);
            for (i, token) in tokens.iter().enumerate() {
                prop_assert!(!token.is_empty());
                prop_assert!(!token.contains(char::is_whitespace));
                prop_assert!(!tokens[..i].contains(token));
            }
        }

        #[test]
        fn prop_split_tokens_keeps_first_seen_order(input in "[ a-e]{0,24}") {
            let tokens = split_tokens(&input);
            let firsts: Vec<usize> = tokens
                .iter()
                .map(|t| input.split_whitespace().position(|w| w == t).unwrap())
                .collect();
            prop_assert!(firsts.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
