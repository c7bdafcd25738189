//! # html-converter
//!
//! Convert HTML to Markdown, with rules that can keep chosen elements as
//! raw HTML.
//!
//! The conversion follows [turndown](https://github.com/mixmark-io/turndown):
//! the HTML is parsed into a node tree, whitespace is collapsed the way a
//! browser would render it, and every element is rendered by the first
//! matching [`Rule`]. Custom rules registered with [`Converter::add_rule`]
//! win over the built-in CommonMark rules.
//!
//! ## Example
//!
//! ```rust
//! use html_converter::Converter;
//!
//! // ATX headings, fenced code blocks, `div` kept verbatim
//! let converter = Converter::standard();
//!
//! let markdown = converter
//!     .convert_html(r#"<h2>Title</h2><div class="note">keep <b>me</b></div>"#)
//!     .unwrap();
//! assert_eq!(markdown, "## Title\n\n<div class=\"note\">keep <b>me</b></div>");
//! ```
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use html_converter::{Converter, Node};
//!
//! let mut h1 = Node::element("h1");
//! h1.add_child(Node::text("Hello World"));
//!
//! let markdown = Converter::new().convert(&h1).unwrap();
//! assert_eq!(markdown, "Hello World\n===========");
//! ```

#[cfg(feature = "html")]
pub mod html;
pub mod node;
mod rules;
mod service;
mod utilities;
mod whitespace;

use once_cell::sync::Lazy;

#[cfg(feature = "html")]
pub use html::parse_html;
pub use node::{Node, NodeRef, NodeType};
pub use rules::{Filter, PredicateFn, ReplacementFn, Rule, Rules, Selected};
pub use service::{CodeBlockStyle, ConversionOptions, Converter, HeadingStyle};
pub use utilities::*;
pub use whitespace::collapse_whitespace;

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid option {name}: {value:?}")]
    InvalidOption { name: &'static str, value: String },

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Convert `html` with the given options and override rules.
///
/// Rules are registered under their keys in iteration order and take
/// precedence over the built-in rules.
#[cfg(feature = "html")]
pub fn convert<I, K>(html: &str, options: ConversionOptions, override_rules: I) -> Result<String>
where
    I: IntoIterator<Item = (K, Rule)>,
    K: AsRef<str>,
{
    let mut converter = Converter::with_options(options)?;
    for (key, rule) in override_rules {
        converter.add_rule(key.as_ref(), rule);
    }
    converter.convert_html(html)
}

static STANDARD: Lazy<Converter> = Lazy::new(Converter::standard);

/// The process-wide [`Converter::standard`] instance, built on first use
pub fn standard_converter() -> &'static Converter {
    &STANDARD
}
