//! Rule system for HTML to Markdown conversion.

mod commonmark;
mod rule;

pub use commonmark::commonmark_rules;
pub use rule::{Filter, PredicateFn, ReplacementFn, Rule};

use indexmap::IndexMap;
use log::trace;

use crate::node::NodeRef;
use crate::service::ConversionOptions;

/// What to do with an element, in order of precedence
pub enum Selected<'r> {
    /// Whitespace-only element with nothing meaningful inside
    Blank,
    /// A custom or built-in rule matched
    Rule(&'r Rule),
    /// A keep filter matched: emit the element as HTML
    Keep,
    /// A remove filter matched: drop the element
    Remove,
    /// Nothing matched: pass the content through
    Default,
}

/// Collection of rules for conversion
pub struct Rules {
    /// Custom rules added by the user (checked first, in registration order)
    custom_rules: IndexMap<String, Rule>,
    /// Keep rules (preserve as HTML)
    keep_rules: Vec<Filter>,
    /// Remove rules (remove entirely)
    remove_rules: Vec<Filter>,
    /// Built-in CommonMark rules
    commonmark_rules: Vec<Rule>,
}

impl Rules {
    /// Create a new Rules instance with CommonMark rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            keep_rules: Vec::new(),
            remove_rules: Vec::new(),
            commonmark_rules: commonmark_rules(),
        }
    }

    /// Add a custom rule. Re-adding a key replaces the rule in place.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Add a keep filter
    pub fn keep(&mut self, filter: Filter) {
        self.keep_rules.push(filter);
    }

    /// Add a remove filter
    pub fn remove(&mut self, filter: Filter) {
        self.remove_rules.push(filter);
    }

    /// Keys of the custom rules, in registration order
    pub fn custom_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_rules.keys().map(String::as_str)
    }

    /// Decide how an element is rendered
    pub fn for_node(&self, node: &NodeRef, options: &ConversionOptions) -> Selected<'_> {
        if node.node.is_blank() {
            return Selected::Blank;
        }

        let tag = node.tag_name();

        for (key, rule) in &self.custom_rules {
            if rule.filter.matches(&tag, node, options) {
                trace!("<{tag}> matched custom rule {key}");
                return Selected::Rule(rule);
            }
        }

        if let Some(rule) = self
            .commonmark_rules
            .iter()
            .find(|rule| rule.filter.matches(&tag, node, options))
        {
            return Selected::Rule(rule);
        }

        if self.keep_rules.iter().any(|f| f.matches(&tag, node, options)) {
            return Selected::Keep;
        }

        if self.remove_rules.iter().any(|f| f.matches(&tag, node, options)) {
            return Selected::Remove;
        }

        Selected::Default
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
