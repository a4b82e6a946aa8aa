//! The node capability the extractor walks.
//!
//! Anything that can report a tag name, read attributes, enumerate children
//! and produce its text content can be mined for microdata. The arena DOM in
//! [`crate::dom`] is the built-in implementation.

/// A read-only view of one node in a document tree.
///
/// Non-element nodes (text, comments, the document itself) report no tag
/// name and no attributes.
pub trait Node: Clone {
    /// Lowercase local name for elements, `None` otherwise.
    fn tag_name(&self) -> Option<&str>;

    /// Raw value of the attribute `name`, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Whether the attribute `name` is present, whatever its value.
    fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Child nodes in document order.
    fn children(&self) -> impl Iterator<Item = Self>;

    /// Concatenated text of every descendant text node.
    fn text(&self) -> String;
}
