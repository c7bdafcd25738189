//! Whitespace collapsing over a node tree.
//!
//! Mirrors how browsers render inline whitespace: runs of ASCII whitespace
//! become a single space, and spaces next to block boundaries disappear.
//! `pre` subtrees are left alone.

use crate::node::{Node, NodeType};

enum Step {
    Text(Vec<usize>),
    Element { block_or_br: bool, void_or_pre: bool },
}

/// Collapse whitespace in every text node below `root`, removing text nodes
/// that end up empty. `root` itself is treated as a block.
pub fn collapse_whitespace(root: &mut Node) {
    if root.first_child().is_none() || is_pre(root) {
        return;
    }

    let mut steps = Vec::new();
    let mut path = Vec::new();
    walk(root, &mut path, &mut steps);

    let mut prev_text: Option<Vec<usize>> = None;
    let mut keep_leading_ws = false;

    for step in steps {
        match step {
            Step::Text(path) => {
                let prev_ends_with_space = match &prev_text {
                    Some(prev) => text_at(root, prev).is_some_and(|t| t.ends_with(' ')),
                    None => true,
                };
                let Some(text) = text_at(root, &path) else {
                    continue;
                };

                let mut collapsed = collapse_runs(text);
                if prev_ends_with_space && !keep_leading_ws && collapsed.starts_with(' ') {
                    collapsed.remove(0);
                }

                let is_empty = collapsed.is_empty();
                set_text(root, &path, collapsed);
                if !is_empty {
                    prev_text = Some(path);
                }
            }
            Step::Element { block_or_br: true, .. } => {
                if let Some(prev) = prev_text.take() {
                    trim_trailing_space(root, &prev);
                }
                keep_leading_ws = false;
            }
            Step::Element { void_or_pre: true, .. } => {
                prev_text = None;
                keep_leading_ws = true;
            }
            Step::Element { .. } => {
                if prev_text.is_some() {
                    keep_leading_ws = false;
                }
            }
        }
    }

    if let Some(prev) = prev_text {
        trim_trailing_space(root, &prev);
    }

    remove_empty_text(root);
}

/// Record text nodes and element boundaries in document order. Elements that
/// were descended into are recorded again on the way out.
fn walk(node: &Node, path: &mut Vec<usize>, steps: &mut Vec<Step>) {
    for (index, child) in node.children().enumerate() {
        path.push(index);
        match child.node_type {
            NodeType::Text => steps.push(Step::Text(path.clone())),
            NodeType::Element => {
                let step = || Step::Element {
                    block_or_br: child.is_block() || child.node_name == "BR",
                    void_or_pre: child.is_void() || is_pre(child),
                };
                steps.push(step());
                if !is_pre(child) && child.first_child().is_some() {
                    walk(child, path, steps);
                    steps.push(step());
                }
            }
            NodeType::DocumentFragment => walk(child, path, steps),
        }
        path.pop();
    }
}

fn is_pre(node: &Node) -> bool {
    node.node_name == "PRE"
}

fn collapse_runs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;

    for c in text.chars() {
        if matches!(c, ' ' | '\r' | '\n' | '\t') {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}

fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    path.iter()
        .try_fold(root, |node, &i| node.children.as_mut()?.get_mut(i))
}

fn text_at<'a>(root: &'a Node, path: &[usize]) -> Option<&'a str> {
    path.iter()
        .try_fold(root, |node, &i| node.children.as_ref()?.get(i))?
        .node_value
        .as_deref()
}

fn set_text(root: &mut Node, path: &[usize], text: String) {
    if let Some(node) = node_at_mut(root, path) {
        node.node_value = Some(text);
    }
}

fn trim_trailing_space(root: &mut Node, path: &[usize]) {
    if let Some(text) = node_at_mut(root, path).and_then(|n| n.node_value.as_mut()) {
        if text.ends_with(' ') {
            text.pop();
        }
    }
}

fn remove_empty_text(node: &mut Node) {
    if let Some(children) = node.children.as_mut() {
        children.retain(|child| !(child.is_text() && child.node_value.as_deref().unwrap_or("").is_empty()));
        for child in children {
            remove_empty_text(child);
        }
    }
}
