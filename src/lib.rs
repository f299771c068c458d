//! XML toolkit based on indextree and quick-xml.
//!
//! xylem provides:
//! - **Hardened parsing**: namespace-aware XML parsing with DTD processing
//!   and entity expansion disabled by construction
//! - **Mutable DOM**: arena-backed tree with cheap element/attribute
//!   handles that keep their identity across mutation and adoption
//! - **XPath queries**: an XPath 1.0 subset with five typed result shapes
//!   and evaluation-time namespace resolution
//! - **Idempotent writing**: a pretty-printer whose output re-parses and
//!   re-prints to the same bytes, and a plain writer that preserves the
//!   tree exactly
//!
//! # Example
//!
//! ```rust
//! use xylem::XmlDataFormat;
//!
//! # fn main() -> xylem::Result<()> {
//! let format = XmlDataFormat::new();
//! let order = format.parse_str("<order><product>Milk</product><product>Coffee</product></order>")?;
//!
//! assert_eq!(order.name(), "order");
//! let products = order.child_elements_ns(None, "product")?;
//! assert_eq!(products.len(), 2);
//! assert_eq!(products[0].text_content(), "Milk");
//!
//! let coffee = order.xpath("/order/product[2]").element()?;
//! assert_eq!(coffee.text_content(), "Coffee");
//!
//! assert_eq!(
//!     order.to_xml()?,
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order>\n  <product>Milk</product>\n  <product>Coffee</product>\n</order>\n"
//! );
//! # Ok(())
//! # }
//! ```

pub mod arena_dom;
mod dom;
mod error;
mod format;
mod iter;
mod parser;
mod query;
mod serialize;
mod xpath;

// Re-export the handle types
pub use dom::{XmlAttribute, XmlElement};

// Re-export the entry point and its builder
pub use format::{XmlDataFormat, XmlDataFormatBuilder};

// Re-export iteration and query surfaces
pub use iter::{AttributeIter, AttributeIterable, ElementIter, ElementIterable};
pub use query::XPathQuery;

pub use error::{Error, Result};

/// Parse with the default [`XmlDataFormat`] (pretty-printing on, doctypes
/// rejected).
pub fn parse(input: &str) -> Result<XmlElement> {
    XmlDataFormat::new().parse_str(input)
}
