//! DOM-like node tree used as the conversion input.
//!
//! Any HTML parser can build this structure; the `html` feature provides one
//! backed by html5ever (see [`crate::parse_html`]).

use crate::utilities::{is_block, is_meaningful_when_blank, is_void};

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

/// An owned DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node type
    pub node_type: NodeType,

    /// Node name (uppercase for elements, e.g., "DIV", "#text" for text nodes)
    pub node_name: String,

    /// Element name as written, case preserved (`clipPath`, `foreignObject`).
    /// Used when serializing back to HTML
    pub local_name: Option<String>,

    /// Text content for text nodes
    pub node_value: Option<String>,

    /// Attributes as flat array [name, value, name, value, ...] in source order.
    /// Only present for element nodes
    pub attributes: Option<Vec<String>>,

    /// Child nodes
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_uppercase(),
            local_name: Some(tag_name.to_string()),
            node_value: None,
            attributes: Some(Vec::new()),
            children: Some(Vec::new()),
        }
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut node = Self::element(tag_name);
        node.attributes = Some(
            attrs
                .into_iter()
                .flat_map(|(k, v)| [k.to_string(), v.to_string()])
                .collect(),
        );
        node
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: "#text".to_string(),
            local_name: None,
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
        }
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        Self {
            node_type: NodeType::DocumentFragment,
            node_name: "#document-fragment".to_string(),
            local_name: None,
            node_value: None,
            attributes: None,
            children: Some(Vec::new()),
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get the tag name (lowercase). Empty for non-element nodes.
    pub fn tag_name(&self) -> String {
        if self.is_element() {
            self.node_name.to_lowercase()
        } else {
            String::new()
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs()
            .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Iterate attributes as `(name, value)` pairs in source order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .flat_map(|attrs| attrs.chunks_exact(2))
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().flat_map(|c| c.iter())
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children().next()
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text_content(&mut out);
        out
    }

    fn push_text_content(&self, out: &mut String) {
        match self.node_type {
            NodeType::Text => out.push_str(self.node_value.as_deref().unwrap_or("")),
            _ => {
                for child in self.children() {
                    child.push_text_content(out);
                }
            }
        }
    }

    /// Check if this is a block-level element
    pub fn is_block(&self) -> bool {
        self.is_element() && is_block(&self.node_name)
    }

    /// Check if this is a void element
    pub fn is_void(&self) -> bool {
        self.is_element() && is_void(&self.node_name)
    }

    /// An element with nothing worth rendering: not void, not meaningful when
    /// blank, whitespace-only text and no such descendants.
    pub fn is_blank(&self) -> bool {
        self.is_element()
            && !self.is_void()
            && !is_meaningful_when_blank(&self.node_name)
            && self.text_content().trim().is_empty()
            && !self.has_descendant(&|n: &Node| {
                n.is_void() || (n.is_element() && is_meaningful_when_blank(&n.node_name))
            })
    }

    fn has_descendant(&self, predicate: &dyn Fn(&Node) -> bool) -> bool {
        self.children()
            .any(|child| predicate(child) || child.has_descendant(predicate))
    }

    /// Serialize this node back to HTML, the way `Element.outerHTML` does
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.serialize_into(&mut out, false);
        out
    }

    /// Serialize the children of this node back to HTML
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.serialize_children(&mut out);
        out
    }

    fn serialize_into(&self, out: &mut String, raw_text: bool) {
        match self.node_type {
            NodeType::Text => {
                let text = self.node_value.as_deref().unwrap_or("");
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_html_text(text, out);
                }
            }
            NodeType::Element => {
                let tag = self.local_name.clone().unwrap_or_else(|| self.tag_name());
                out.push('<');
                out.push_str(&tag);
                for (name, value) in self.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_html_attr(value, out);
                    out.push('"');
                }
                out.push('>');

                if self.is_void() {
                    return;
                }

                self.serialize_children(out);
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
            NodeType::DocumentFragment => self.serialize_children(out),
        }
    }

    fn serialize_children(&self, out: &mut String) {
        const RAW_TEXT_ELEMENTS: &[&str] = &[
            "STYLE", "SCRIPT", "XMP", "IFRAME", "NOEMBED", "NOFRAMES", "PLAINTEXT",
        ];
        let raw_text = self.is_element() && RAW_TEXT_ELEMENTS.contains(&self.node_name.as_str());
        for child in self.children() {
            child.serialize_into(out, raw_text);
        }
    }
}

fn escape_html_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_html_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// A node together with its position in the parent.
///
/// Rules receive a `NodeRef` so they can look at the parent and siblings
/// without the tree storing back pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a Node>,
    index: usize,
    in_code: bool,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
            in_code: node.node_name == "CODE",
        }
    }

    /// Create a reference to the `index`-th child of `parent`
    pub(crate) fn child_of(parent: &NodeRef<'a>, node: &'a Node, index: usize) -> Self {
        Self {
            node,
            parent: Some(parent.node),
            index,
            in_code: parent.in_code || node.node_name == "CODE",
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<String> {
        self.parent.map(Node::tag_name)
    }

    /// True when this node is a `code` element or sits inside one
    pub fn is_code(&self) -> bool {
        self.in_code
    }

    pub fn previous_sibling(&self) -> Option<&'a Node> {
        let children = self.parent?.children.as_ref()?;
        self.index.checked_sub(1).and_then(|i| children.get(i))
    }

    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.parent?.children.as_ref()?.get(self.index + 1)
    }

    /// Position among the parent's element children
    pub fn element_index(&self) -> usize {
        self.parent
            .map(|parent| {
                parent
                    .children()
                    .take(self.index)
                    .filter(|n| n.is_element())
                    .count()
            })
            .unwrap_or(0)
    }

    /// True when this node is the last element child of its parent
    pub fn is_last_element_child(&self) -> bool {
        self.parent
            .and_then(|parent| parent.element_children().last())
            .is_some_and(|last| std::ptr::eq(last, self.node))
    }

    pub fn is_element(&self) -> bool {
        self.node.is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.is_text()
    }

    pub fn is_block(&self) -> bool {
        self.node.is_block()
    }

    pub fn tag_name(&self) -> String {
        self.node.tag_name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn first_child(&self) -> Option<&'a Node> {
        self.node.first_child()
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.children()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }

    pub fn outer_html(&self) -> String {
        self.node.outer_html()
    }

    pub fn inner_html(&self) -> String {
        self.node.inner_html()
    }
}
