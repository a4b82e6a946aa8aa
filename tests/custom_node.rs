//! Extraction over a tree that is not the built-in arena DOM.
//!
//! Exercises the `Node` trait as the only contract the walker relies on.

use std::rc::Rc;

use microdata::{Config, MAX_ITEM_DEPTH, Node, ValueSource, extract};

#[derive(Debug)]
enum Kind {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
    },
    Text(&'static str),
}

#[derive(Debug, Clone)]
struct TestNode(Rc<(Kind, Vec<TestNode>)>);

fn el(tag: &'static str, attrs: &[(&'static str, &'static str)], children: Vec<TestNode>) -> TestNode {
    TestNode(Rc::new((
        Kind::Element {
            tag,
            attrs: attrs.to_vec(),
        },
        children,
    )))
}

fn text(s: &'static str) -> TestNode {
    TestNode(Rc::new((Kind::Text(s), Vec::new())))
}

impl Node for TestNode {
    fn tag_name(&self) -> Option<&str> {
        match &self.0.0 {
            Kind::Element { tag, .. } => Some(*tag),
            Kind::Text(_) => None,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        match &self.0.0 {
            Kind::Element { attrs, .. } => attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v),
            Kind::Text(_) => None,
        }
    }

    fn children(&self) -> impl Iterator<Item = Self> {
        self.0.1.iter().cloned()
    }

    fn text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            if let Kind::Text(s) = &node.0.0 {
                out.push_str(s);
            }
            stack.extend(node.0.1.iter().rev().cloned());
        }
        out
    }
}

#[test]
fn test_extract_from_custom_tree() {
    let root = el(
        "root",
        &[],
        vec![el(
            "div",
            &[("itemscope", ""), ("itemtype", "Event")],
            vec![
                el("span", &[("itemprop", "name")], vec![text("Launch "), text("party")]),
                el("time", &[("itemprop", "startDate"), ("datetime", "2025-03-01")], vec![]),
                el("a", &[("itemprop", "url"), ("href", "events/launch")], vec![text("details")]),
            ],
        )],
    );

    let data = extract(root, &Config::new().with_base("https://example.org/"));
    assert_eq!(data.items.len(), 1);

    let event = &data.items[0];
    assert_eq!(event.types, Some(vec!["Event".to_string()]));
    assert_eq!(event.properties["name"][0].as_text(), Some("Launch party"));
    assert_eq!(event.properties["startDate"][0].as_text(), Some("2025-03-01"));
    assert_eq!(
        event.properties["url"][0].as_text(),
        Some("https://example.org/events/launch")
    );
}

#[test]
fn test_classify_custom_nodes() {
    let img = el("img", &[("src", "x")], vec![]);
    let scoped_img = el("img", &[("itemscope", "")], vec![]);
    let span = el("span", &[], vec![]);

    assert_eq!(ValueSource::classify(&img), ValueSource::Url("src"));
    assert_eq!(ValueSource::classify(&scoped_img), ValueSource::Item);
    assert_eq!(ValueSource::classify(&span), ValueSource::Text);
    assert_eq!(ValueSource::classify(&text("t")), ValueSource::Text);
}

#[test]
fn test_very_deep_tree_is_walked_iteratively() {
    const DEPTH: usize = 200_000;

    // Innermost first: an item with one property, wrapped in DEPTH plain divs
    // under an outer item.
    let mut node = el(
        "div",
        &[("itemprop", "inner"), ("itemscope", "")],
        vec![el("b", &[("itemprop", "leaf")], vec![text("bottom")])],
    );
    for _ in 0..DEPTH {
        node = el("div", &[], vec![node]);
    }
    let root = el("div", &[("itemscope", "")], vec![node]);

    let data = extract(root.clone(), &Config::default());
    assert_eq!(data.items.len(), 1);
    let inner = data.items[0].properties["inner"][0].as_item().unwrap();
    assert_eq!(inner.properties["leaf"][0].as_text(), Some("bottom"));

    drop(data);
    unwind(root);
}

#[test]
fn test_deep_item_valued_chain() {
    const DEPTH: usize = 20_000;

    let mut node = el("span", &[("itemprop", "leaf")], vec![text("bottom")]);
    for _ in 0..DEPTH {
        node = el("div", &[("itemprop", "child"), ("itemscope", "")], vec![node]);
    }
    let root = el("div", &[("itemscope", "")], vec![node]);

    let data = extract(root.clone(), &Config::default());
    assert_eq!(data.items.len(), 1);

    let mut item = &data.items[0];
    let mut levels = 1;
    while let Some(next) = item.properties.get("child").and_then(|v| v[0].as_item()) {
        item = next;
        levels += 1;
    }
    assert_eq!(levels, MAX_ITEM_DEPTH);
    assert_eq!(item.properties["child"][0].as_text(), Some("bottom"));

    let json = data.to_json().unwrap();
    assert!(json.contains(r#""child":["bottom"]"#));
    drop(data);
    unwind(root);
}

// Rc chains drop recursively; unwind the tree by hand.
fn unwind(root: TestNode) {
    let mut current = Some(root);
    while let Some(TestNode(rc)) = current.take() {
        if let Ok((_, mut children)) = Rc::try_unwrap(rc) {
            current = children.pop();
        }
    }
}
