//! Owned, read-only HTML tree walked by the converter.
//!
//! The parser's DOM is turned into this small tree once per page so the
//! converter can pattern-match on node kinds without holding borrows into the
//! parser's arena.

use std::collections::BTreeMap;

/// A node of the question tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
}

impl HtmlNode {
    pub fn text(s: impl Into<String>) -> Self {
        HtmlNode::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            HtmlNode::Element(e) => Some(e),
            HtmlNode::Text(_) => None,
        }
    }
}

impl From<Element> for HtmlNode {
    fn from(e: Element) -> Self {
        HtmlNode::Element(e)
    }
}

/// An element with lowercase tag name, attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<HtmlNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(HtmlNode::as_element)
    }

    /// First descendant (depth-first, excluding `self`) matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated descendant text, as written in the source.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(e) => collect_text(e, out),
        }
    }
}
