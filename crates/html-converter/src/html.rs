//! HTML parsing support.
//!
//! Parses HTML strings with html5ever (through `scraper`) and converts the
//! result to the [`Node`] structure used by the converter. Parsing is
//! lenient: any input yields a tree.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a Node tree rooted at an `html` element.
///
/// Comments, doctypes and processing instructions are dropped.
///
/// # Example
///
/// ```rust
/// use html_converter::{parse_html, Converter};
///
/// let node = parse_html("<h1>Hello <em>World</em></h1>");
///
/// let markdown = Converter::standard().convert(&node).unwrap();
/// assert_eq!(markdown, "# Hello _World_");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    log::trace!("parsed {} bytes of html", html.len());
    scraper_to_node(document.root_element())
}

/// Convert a scraper ElementRef to our Node structure.
///
/// Names keep the case html5ever gives them (`clipPath`) and attributes keep
/// their namespace prefix (`xlink:href`).
fn scraper_to_node(element: ElementRef) -> Node {
    let mut node = Node::element(element.value().name());
    node.attributes = Some(
        element
            .value()
            .attrs
            .iter()
            .flat_map(|(name, value)| {
                let name = match &name.prefix {
                    Some(prefix) => format!("{}:{}", prefix, name.local),
                    None => name.local.to_string(),
                };
                [name, String::from(&**value)]
            })
            .collect(),
    );

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                node.add_child(Node::text(&text.text));
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.add_child(scraper_to_node(child_element));
                }
            }
            _ => {}
        }
    }

    node
}
