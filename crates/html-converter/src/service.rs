//! Converter - the main entry point for HTML to Markdown conversion.

use log::debug;

use crate::node::{Node, NodeRef, NodeType};
use crate::rules::{Filter, Rule, Rules, Selected};
use crate::utilities::{edge_whitespace, escape_markdown, join};
use crate::whitespace::collapse_whitespace;
use crate::{ConversionError, Result};

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    #[default]
    Setext,
    /// Use ATX-style headings (prefixed with #)
    Atx,
}

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use indented code blocks (4 spaces)
    #[default]
    Indented,
    /// Use fenced code blocks (```)
    Fenced,
}

/// Options for the Converter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Heading style (setext or atx)
    pub heading_style: HeadingStyle,

    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence string for fenced code blocks
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Text emitted before the newline of a hard line break
    pub br: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Setext,
            hr: "* * *".to_string(),
            bullet_list_marker: '*',
            code_block_style: CodeBlockStyle::Indented,
            fence: "```".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            br: "  ".to_string(),
        }
    }
}

impl ConversionOptions {
    /// ATX headings and fenced code blocks, everything else default
    pub fn standard() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        }
    }

    /// Reject options that would produce broken Markdown
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &'static str, value: impl ToString) -> Result<()> {
            Err(ConversionError::InvalidOption {
                name,
                value: value.to_string(),
            })
        }

        if !matches!(self.bullet_list_marker, '*' | '-' | '+') {
            return invalid("bullet_list_marker", self.bullet_list_marker);
        }
        if !matches!(self.em_delimiter, '_' | '*') {
            return invalid("em_delimiter", self.em_delimiter);
        }
        if !matches!(self.strong_delimiter.as_str(), "**" | "__") {
            return invalid("strong_delimiter", &self.strong_delimiter);
        }
        if !matches!(self.fence.as_str(), "```" | "~~~") {
            return invalid("fence", &self.fence);
        }
        if self.hr.trim().is_empty() || self.hr.contains('\n') {
            return invalid("hr", &self.hr);
        }
        Ok(())
    }
}

/// The main service for converting HTML to Markdown
pub struct Converter {
    options: ConversionOptions,
    rules: Rules,
}

impl Converter {
    /// Create a new Converter with default options
    pub fn new() -> Self {
        Self {
            options: ConversionOptions::default(),
            rules: Rules::new(),
        }
    }

    /// Create a Converter with custom options
    pub fn with_options(options: ConversionOptions) -> Result<Self> {
        options.validate().inspect_err(|e| debug!("rejected options: {e}"))?;
        Ok(Self {
            options,
            rules: Rules::new(),
        })
    }

    /// ATX headings, fenced code blocks, and `div` elements kept as raw HTML
    pub fn standard() -> Self {
        let mut converter = Self {
            options: ConversionOptions::standard(),
            rules: Rules::new(),
        };
        converter.add_rule("keepDiv", Rule::outer_html(Filter::tag("div")));
        converter
    }

    /// Convert a node tree to Markdown.
    ///
    /// A document fragment or `html` root contributes only its children; any
    /// other element is converted together with its subtree.
    pub fn convert(&self, node: &Node) -> Result<String> {
        let root = if node.node_type == NodeType::DocumentFragment || node.node_name == "HTML" {
            node.clone()
        } else {
            let mut fragment = Node::document_fragment();
            fragment.add_child(node.clone());
            fragment
        };
        Ok(self.convert_root(root))
    }

    /// Convert an HTML string to Markdown
    #[cfg(feature = "html")]
    pub fn convert_html(&self, html: &str) -> Result<String> {
        if html.is_empty() {
            return Ok(String::new());
        }
        Ok(self.convert_root(crate::html::parse_html(html)))
    }

    /// Read `reader` to the end, then convert what was read as HTML.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    #[cfg(feature = "html")]
    pub fn convert_reader<R: std::io::Read>(&self, mut reader: R) -> Result<String> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        debug!("read {} bytes of input", bytes.len());

        let html = match String::from_utf8(bytes) {
            Ok(html) => html,
            Err(e) => {
                log::warn!("input is not valid UTF-8 ({}), replacing invalid sequences", e.utf8_error());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        self.convert_html(&html)
    }

    /// Add a custom rule. Custom rules are checked before the built-in ones,
    /// in the order they were added.
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Keep elements matching the filter as HTML
    pub fn keep(&mut self, filter: Filter) -> &mut Self {
        self.rules.keep(filter);
        self
    }

    /// Remove elements matching the filter
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    /// Get the current options
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    fn convert_root(&self, mut root: Node) -> String {
        collapse_whitespace(&mut root);
        let output = self.process(&NodeRef::new(&root));
        post_process(&output)
    }

    /// Render the children of a node and join the results
    fn process(&self, parent: &NodeRef) -> String {
        let Some(children) = parent.node.children.as_ref() else {
            return String::new();
        };

        children.iter().enumerate().fold(String::new(), |output, (index, child)| {
            let node = NodeRef::child_of(parent, child, index);
            let replacement = match child.node_type {
                NodeType::Text => {
                    let text = child.node_value.as_deref().unwrap_or("");
                    if node.is_code() {
                        text.to_string()
                    } else {
                        escape_markdown(text)
                    }
                }
                NodeType::Element => self.replacement_for_node(&node),
                NodeType::DocumentFragment => self.process(&node),
            };
            join(&output, &replacement)
        })
    }

    fn replacement_for_node(&self, node: &NodeRef) -> String {
        let selected = self.rules.for_node(node, &self.options);
        let content = match selected {
            Selected::Rule(rule) if rule.uses_content() => self.process(node),
            Selected::Default => self.process(node),
            _ => String::new(),
        };
        let (leading, trailing) = flanking_whitespace(node);

        let content = if leading.is_empty() && trailing.is_empty() {
            content.as_str()
        } else {
            content.trim()
        };

        let replacement = match selected {
            Selected::Blank if node.is_block() => "\n\n".to_string(),
            Selected::Blank | Selected::Remove => String::new(),
            Selected::Rule(rule) => rule.replace(node, content, &self.options),
            Selected::Keep if node.is_block() => format!("\n\n{}\n\n", node.outer_html()),
            Selected::Keep => node.outer_html(),
            Selected::Default if node.is_block() => format!("\n\n{}\n\n", content),
            Selected::Default => content.to_string(),
        };

        format!("{}{}{}", leading, replacement, trailing)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitespace to move outside an inline element's delimiters. ASCII
/// whitespace is dropped when the neighbouring sibling already provides it.
fn flanking_whitespace(node: &NodeRef) -> (String, String) {
    if node.is_block() {
        return (String::new(), String::new());
    }

    let text = node.text_content();
    let edges = edge_whitespace(&text);

    let flanked_left = is_flanked_by_whitespace(node.previous_sibling(), |s| s.ends_with(' '));
    let flanked_right = is_flanked_by_whitespace(node.next_sibling(), |s| s.starts_with(' '));

    let leading = if !edges.leading_ascii.is_empty() && flanked_left {
        edges.leading_non_ascii
    } else {
        edges.leading
    };
    let trailing = if !edges.trailing_ascii.is_empty() && flanked_right {
        edges.trailing_non_ascii
    } else {
        edges.trailing
    };

    (leading.to_string(), trailing.to_string())
}

fn is_flanked_by_whitespace(sibling: Option<&Node>, test: impl Fn(&str) -> bool) -> bool {
    match sibling {
        Some(node) if node.is_text() => test(node.node_value.as_deref().unwrap_or("")),
        Some(node) if node.is_element() && !node.is_block() => test(&node.text_content()),
        _ => false,
    }
}

/// Strip leading tabs and newlines and all trailing whitespace
fn post_process(output: &str) -> String {
    output
        .trim_start_matches(['\t', '\r', '\n'])
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        Converter::new().convert_html(html).unwrap()
    }

    fn convert_standard(html: &str) -> String {
        Converter::standard().convert_html(html).unwrap()
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(convert("<p>Hello World</p>"), "Hello World");
    }

    #[test]
    fn test_heading_setext() {
        assert_eq!(convert("<h1>Title</h1>"), "Title\n=====");
        assert_eq!(convert("<h2>Sub</h2>"), "Sub\n---");
        assert_eq!(convert("<h3>Deep</h3>"), "### Deep");
    }

    #[test]
    fn test_heading_atx() {
        let options = ConversionOptions {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        };
        let service = Converter::with_options(options).unwrap();
        assert_eq!(service.convert_html("<h1>Title</h1>").unwrap(), "# Title");
    }

    #[test]
    fn test_emphasis_and_strong() {
        assert_eq!(convert("<em>emphasized</em>"), "_emphasized_");
        assert_eq!(convert("<strong>bold</strong>"), "**bold**");
        assert_eq!(convert("<b> </b>x"), "x");
    }

    #[test]
    fn test_flanking_whitespace_moves_outside_delimiters() {
        assert_eq!(convert("<p>a<b> bold </b>c</p>"), "a **bold** c");
        assert_eq!(convert("<p>a <b> bold</b></p>"), "a **bold**");
    }

    #[test]
    fn test_inline_link() {
        assert_eq!(
            convert(r#"<a href="https://example.com">Link</a>"#),
            "[Link](https://example.com)"
        );
        assert_eq!(
            convert(r#"<a href="/wiki/A_(b)" title="say &quot;hi&quot;">x</a>"#),
            r#"[x](/wiki/A_\(b\) "say \"hi\"")"#
        );
        assert_eq!(convert("<a>bare</a>"), "bare");
    }

    #[test]
    fn test_image() {
        assert_eq!(
            convert(r#"<img src="test.png" alt="Alt" title="T">"#),
            "![Alt](test.png \"T\")"
        );
        assert_eq!(convert(r#"<img alt="no source">"#), "");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(convert("<code>code</code>"), "`code`");
        assert_eq!(convert("<code>a`b</code>"), "``a`b``");
        assert_eq!(convert("<code>`tick</code>"), "`` `tick ``");
        assert_eq!(convert("<p><code>*not escaped*</code></p>"), "`*not escaped*`");
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(convert("<p>a</p><hr><p>b</p>"), "a\n\n* * *\n\nb");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            convert("<blockquote><p>One</p><p>Two</p></blockquote>"),
            "> One\n> \n> Two"
        );
    }

    #[test]
    fn test_indented_code_block() {
        assert_eq!(
            convert("<pre><code>function() {}\nreturn;</code></pre>"),
            "    function() {}\n    return;"
        );
    }

    #[test]
    fn test_fenced_code_block() {
        assert_eq!(
            convert_standard("<pre><code>line1\nline2</code></pre>"),
            "```\nline1\nline2\n```"
        );
        assert_eq!(
            convert_standard("<pre><code>line1\nline2\n</code></pre>"),
            "```\nline1\nline2\n```"
        );
        assert_eq!(
            convert_standard(r#"<pre><code class="language-rust">let x = 1;</code></pre>"#),
            "```rust\nlet x = 1;\n```"
        );
    }

    #[test]
    fn test_fence_longer_than_inner_fence() {
        assert_eq!(
            convert_standard("<pre><code>```\nx\n```</code></pre>"),
            "````\n```\nx\n```\n````"
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(convert("<ol><li>One</li><li>Two</li></ol>"), "1.  One\n2.  Two");
        assert_eq!(
            convert(r#"<ol start="7"><li>Seven</li><li>Eight</li></ol>"#),
            "7.  Seven\n8.  Eight"
        );
    }

    #[test]
    fn test_ordered_list_start_near_integer_limit() {
        assert_eq!(
            convert(r#"<ol start="9223372036854775807"><li>a</li><li>b</li></ol>"#),
            "9223372036854775807.  a\n9223372036854775808.  b"
        );
        assert_eq!(
            convert(r#"<ol start="-3"><li>a</li><li>b</li></ol>"#),
            "-3.  a\n-2.  b"
        );
    }

    #[test]
    fn test_unordered_list_with_marker() {
        let options = ConversionOptions {
            bullet_list_marker: '-',
            ..Default::default()
        };
        let service = Converter::with_options(options).unwrap();
        assert_eq!(
            service.convert_html("<ul><li>One</li><li>Two</li></ul>").unwrap(),
            "-   One\n-   Two"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            convert("<ul><li>One<ul><li>Inner</li></ul></li><li>Two</li></ul>"),
            "*   One\n    *   Inner\n*   Two"
        );
    }

    #[test]
    fn test_line_break() {
        assert_eq!(convert("<p>one<br>two</p>"), "one  \ntwo");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(convert("<p>1. not a list *really*</p>"), "1\\. not a list \\*really\\*");
    }

    #[test]
    fn test_keep_div_rule() {
        assert_eq!(
            convert_standard(r#"<div class="x">hello <b>world</b></div>"#),
            r#"<div class="x">hello <b>world</b></div>"#
        );
    }

    #[test]
    fn test_keep_div_between_paragraphs() {
        assert_eq!(
            convert_standard("<p>before</p><div>inside</div><p>after</p>"),
            "before\n\n<div>inside</div>\n\nafter"
        );
    }

    #[test]
    fn test_blank_div_is_dropped() {
        assert_eq!(convert_standard("<p>a</p><div> </div><p>b</p>"), "a\n\nb");
    }

    #[test]
    fn test_keep_and_remove_filters() {
        let mut service = Converter::new();
        service.keep(Filter::tag("span")).remove(Filter::tag("del"));
        assert_eq!(
            service
                .convert_html(r#"<p>a <span class="s">b</span> <del>c</del>d</p>"#)
                .unwrap(),
            r#"a <span class="s">b</span> d"#
        );
    }

    #[test]
    fn test_use_plugin() {
        let mut service = Converter::new();
        service.use_plugin(|s| {
            s.add_rule("strike", Rule::for_tags(&["del", "s"], |_, content, _| format!("~~{}~~", content)));
        });
        assert_eq!(service.convert_html("<del>gone</del>").unwrap(), "~~gone~~");
    }

    #[test]
    fn test_convert_node() {
        let mut h1 = Node::element("h1");
        h1.add_child(Node::text("Hello World"));
        assert_eq!(Converter::standard().convert(&h1).unwrap(), "# Hello World");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("   \n  "), "");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ConversionOptions {
            fence: "``".to_string(),
            ..Default::default()
        };
        let err = Converter::with_options(options).err().unwrap();
        assert!(matches!(err, ConversionError::InvalidOption { name: "fence", .. }));
    }

    #[test]
    fn test_convert_reader_replaces_invalid_utf8() {
        let input: &[u8] = b"<p>caf\xe9</p>";
        let result = Converter::new().convert_reader(input).unwrap();
        assert_eq!(result, "caf\u{fffd}");
    }
}
