//! CommonMark rules for HTML to Markdown conversion.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Filter, Rule};
use crate::node::{Node, NodeRef};
use crate::service::{CodeBlockStyle, HeadingStyle};
use crate::utilities::{clean_attribute, repeat};

/// Create all CommonMark rules
pub fn commonmark_rules() -> Vec<Rule> {
    vec![
        paragraph_rule(),
        line_break_rule(),
        heading_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        indented_code_block_rule(),
        fenced_code_block_rule(),
        horizontal_rule(),
        inline_link_rule(),
        emphasis_rule(),
        strong_rule(),
        code_rule(),
        image_rule(),
    ]
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| format!("\n\n{}\n\n", content))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, options| format!("{}\n", options.br))
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, options| {
        let level: usize = node.tag_name()[1..].parse().unwrap_or(1);

        match options.heading_style {
            HeadingStyle::Setext if level < 3 => {
                let underline = if level == 1 { "=" } else { "-" };
                format!(
                    "\n\n{}\n{}\n\n",
                    content,
                    repeat(underline, content.chars().count())
                )
            }
            _ => format!("\n\n{} {}\n\n", repeat("#", level), content),
        }
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim_matches('\n');
        let quoted: Vec<String> = content.split('\n').map(|line| format!("> {}", line)).collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |node, content, _| {
        let nested_last = node.parent_tag().as_deref() == Some("li") && node.is_last_element_child();

        if nested_last {
            format!("\n{}", content)
        } else {
            format!("\n\n{}\n\n", content)
        }
    })
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let mut content = content.trim_start_matches('\n').to_string();
        let trimmed_len = content.trim_end_matches('\n').len();
        if trimmed_len < content.len() {
            content.truncate(trimmed_len);
            content.push('\n');
        }
        let content = content.replace('\n', "\n    ");

        let prefix = match node.parent() {
            Some(parent) if parent.node_name == "OL" => {
                let index = node.element_index();
                let number = parent
                    .attr("start")
                    .and_then(|start| start.trim().parse::<i128>().ok())
                    .map(|start| start + index as i128)
                    .unwrap_or(index as i128 + 1);
                format!("{}.  ", number)
            }
            _ => format!("{}   ", options.bullet_list_marker),
        };

        let separator = if node.next_sibling().is_some() && !content.ends_with('\n') {
            "\n"
        } else {
            ""
        };

        format!("{}{}{}", prefix, content, separator)
    })
}

/// The `<code>` child that makes a `<pre>` a code block
fn code_block_child<'a>(node: &NodeRef<'a>) -> Option<&'a Node> {
    node.first_child().filter(|child| child.node_name == "CODE")
}

fn is_code_block(tag: &str, node: &NodeRef) -> bool {
    tag == "pre" && code_block_child(node).is_some()
}

fn indented_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, options| {
            options.code_block_style == CodeBlockStyle::Indented && is_code_block(tag, node)
        }),
        |node, _, _| {
            let code = code_block_child(node).map(Node::text_content).unwrap_or_default();
            format!("\n\n    {}\n\n", code.replace('\n', "\n    "))
        },
    )
}

static LANGUAGE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"language-(\S+)").expect("valid regex"));

fn fenced_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, options| {
            options.code_block_style == CodeBlockStyle::Fenced && is_code_block(tag, node)
        }),
        |node, _, options| {
            let Some(code_node) = code_block_child(node) else {
                return String::new();
            };

            let language = code_node
                .attr("class")
                .and_then(|class| LANGUAGE_CLASS.captures(class))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or("");

            let code = code_node.text_content();
            let fence_char = options.fence.chars().next().unwrap_or('`');
            let fence = repeat(&fence_char.to_string(), fence_size(&code, fence_char));

            // Exactly one trailing newline belongs to the last line, not to the block.
            let code = code.strip_suffix('\n').unwrap_or(&code);

            format!("\n\n{}{}\n{}\n{}\n\n", fence, language, code, fence)
        },
    )
}

/// Fence length needed so no line of `code` closes the block early
fn fence_size(code: &str, fence_char: char) -> usize {
    code.split('\n')
        .map(|line| line.chars().take_while(|&c| c == fence_char).count())
        .filter(|&run| run >= 3)
        .fold(3, |size, run| if run >= size { run + 1 } else { size })
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| format!("\n\n{}\n\n", options.hr))
}

fn inline_link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "a" && node.attr("href").is_some_and(|href| !href.is_empty())
        }),
        |node, content, _| {
            let href = node
                .attr("href")
                .unwrap_or("")
                .replace('(', "\\(")
                .replace(')', "\\)");
            let title = clean_attribute(node.attr("title"));
            let title_part = if title.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", title.replace('"', "\\\""))
            };

            format!("[{}]({}{})", content, href, title_part)
        },
    )
}

fn delimited(content: &str, delimiter: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    format!("{}{}{}", delimiter, content, delimiter)
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, options| {
        delimited(content, &options.em_delimiter.to_string())
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, options| {
        delimited(content, &options.strong_delimiter)
    })
}

static LINE_ENDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n|\r").expect("valid regex"));

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            if tag != "code" {
                return false;
            }
            let has_siblings = node.previous_sibling().is_some() || node.next_sibling().is_some();
            let is_code_block = node.parent_tag().as_deref() == Some("pre") && !has_siblings;
            !is_code_block
        }),
        |_, content, _| {
            if content.is_empty() {
                return String::new();
            }
            let content = LINE_ENDINGS.replace_all(content, " ");
            let delimiter = shortest_free_delimiter(&content);

            let padded = content.starts_with('`')
                || content.ends_with('`')
                || (content.starts_with(' ')
                    && content.ends_with(' ')
                    && content.chars().any(|c| c != ' '));
            let space = if padded { " " } else { "" };

            format!("{}{}{}{}{}", delimiter, space, content, space, delimiter)
        },
    )
}

/// Shortest backtick string that does not occur as a run inside `content`
fn shortest_free_delimiter(content: &str) -> String {
    let runs: Vec<usize> = content
        .split(|c: char| c != '`')
        .map(str::len)
        .filter(|&len| len > 0)
        .collect();
    let size = (1..).find(|size| !runs.contains(size)).unwrap_or(1);
    "`".repeat(size)
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = clean_attribute(node.attr("alt"));
        let src = node.attr("src").unwrap_or("");
        let title = clean_attribute(node.attr("title"));

        if src.is_empty() {
            return String::new();
        }

        let title_part = if title.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", title)
        };

        format!("![{}]({}{})", alt, src, title_part)
    })
}
