//! # microdata
//!
//! Extract [HTML Microdata] items from HTML documents into a plain,
//! serializable model.
//!
//! ## Quick Start
//!
//! ```
//! use microdata::{extract_html, Config};
//!
//! let html = r#"
//!     <div itemscope itemtype="https://schema.org/Person">
//!         <span itemprop="name">Jane Doe</span>
//!         <img itemprop="image" src="jane.jpg">
//!     </div>"#;
//!
//! let config = Config::new().with_base("https://example.com/people/");
//! let data = extract_html(html, &config);
//!
//! let person = &data.items[0];
//! assert_eq!(person.types.as_deref(), Some(&["https://schema.org/Person".to_string()][..]));
//! assert_eq!(person.properties["name"][0].as_text(), Some("Jane Doe"));
//! assert_eq!(
//!     person.properties["image"][0].as_text(),
//!     Some("https://example.com/people/jane.jpg")
//! );
//! ```
//!
//! ## Other trees
//!
//! [`extract`] walks anything implementing [`Node`], so a DOM from another
//! parser can be mined without going through [`dom::Document`].
//!
//! [HTML Microdata]: https://html.spec.whatwg.org/multipage/microdata.html

pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod item;
pub mod node;
pub(crate) mod util;

pub use config::Config;
pub use dom::Document;
pub use error::{Error, Result};
pub use extract::{Extraction, MAX_ITEM_DEPTH, Microdata, ValueSource, extract, extract_items};
pub use item::{Item, ItemGraph, ItemId, SerializedItem, SerializedValue, Value};
pub use node::Node;

/// Parse `html` and extract every microdata item in it.
pub fn extract_html(html: &str, config: &Config) -> Microdata {
    let document = Document::parse(html);
    extract(document.root(), config)
}

/// Decode and parse HTML bytes, then extract every microdata item.
///
/// Decoding prefers UTF-8, then a `<meta charset>` declaration, then
/// Windows-1252.
pub fn extract_html_bytes(html: &[u8], config: &Config) -> Microdata {
    let document = Document::parse_bytes(html);
    extract(document.root(), config)
}

/// Extract items from every outermost element matching `selector`, in
/// document order.
pub fn extract_selected(document: &Document, selector: &str, config: &Config) -> Result<Microdata> {
    let mut items = Vec::new();
    for node in document.select_outermost(selector)? {
        items.extend(extract(node, config).items);
    }
    Ok(Microdata { items })
}
