//! HTML parsing: build the owned [`Element`] tree and locate the question root.

use crate::error::Fe2MdError;
use crate::pipeline::dom::{Element, HtmlNode};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// Parse a full page and return the first element matching `selector`.
///
/// `url` is only used for the error message.
pub fn locate_root(html: &str, selector: &str, url: &str) -> Result<Element, Fe2MdError> {
    let sel = Selector::parse(selector).map_err(|e| Fe2MdError::InvalidSelector {
        selector: selector.to_string(),
        detail: e.to_string(),
    })?;
    let document = Html::parse_document(html);
    let root = document
        .select(&sel)
        .next()
        .ok_or_else(|| Fe2MdError::RootNotFound {
            url: url.to_string(),
            selector: selector.to_string(),
        })?;
    debug!("Located root <{}> for selector {}", root.value().name(), selector);
    Ok(build_element(root))
}

/// Parse an HTML fragment. The returned element is a synthetic container
/// whose children are the fragment's top-level nodes.
pub fn parse_fragment(html: &str) -> Element {
    let fragment = Html::parse_fragment(html);
    let mut root = build_element(fragment.root_element());
    root.tag = "#fragment".to_string();
    root
}

fn build_element(element: ElementRef<'_>) -> Element {
    let value = element.value();
    let mut out = Element::new(value.name());
    for (name, val) in value.attrs() {
        out.attrs.insert(name.to_string(), val.to_string());
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Adjacent text nodes are merged so whitespace collapsing sees one run.
                if let Some(HtmlNode::Text(prev)) = out.children.last_mut() {
                    prev.push_str(&text.text);
                } else {
                    out.children.push(HtmlNode::text(&*text.text));
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    out.children.push(HtmlNode::Element(build_element(child_element)));
                }
            }
            _ => {}
        }
    }

    out
}
