//! Page layout: pick the question sections out of the root container.
//!
//! Exam-question pages put everything (breadcrumbs, the question, answer
//! buttons, explanation, navigation) under one container. In
//! [`LayoutMode::Question`] only the parts that make up the question are kept;
//! [`LayoutMode::Whole`] hands the full container to the converter.

use crate::config::LayoutMode;
use crate::pipeline::dom::Element;
use crate::pipeline::markdown::{collapse_whitespace, NodeConverter};
use tracing::debug;

/// Heading text marking the end of the question ("list of questions").
const STOP_HEADING: &str = "問題一覧";

/// Heading texts of interactive answer/explanation sections.
const SKIPPED_HEADINGS: &[&str] = &["解答", "解説"];

/// Render `root` to Markdown according to `mode`.
pub fn render_page(root: &Element, mode: LayoutMode, converter: &mut NodeConverter<'_>) -> String {
    match mode {
        LayoutMode::Whole => converter.convert_children(root),
        LayoutMode::Question => render_question(root, converter),
    }
}

fn render_question(root: &Element, converter: &mut NodeConverter<'_>) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for el in root.child_elements() {
        if el.is("h2") {
            continue;
        }
        if el.has_class("pan") || el.has_class("pdflink") {
            continue;
        }
        if el.has_class("img_margin") && el.find(&|e| e.is("ul") && e.id() == Some("btmNav")).is_some() {
            continue;
        }

        if el.is("h3") {
            let text = collapse_whitespace(&el.text_content()).trim_ascii().to_string();
            if text.contains(STOP_HEADING) {
                debug!("Reached '{}', stopping", text);
                break;
            }
            if SKIPPED_HEADINGS.iter().any(|h| text.contains(h)) {
                continue;
            }
            if !text.is_empty() {
                blocks.push(format!("### {text}"));
            }
            continue;
        }

        if el.has_class("mondai") {
            blocks.push(converter.convert_children(el));
            continue;
        }

        if el.has_class("select") && el.has_class("ansbg") {
            blocks.push("---".to_string());
            blocks.push(converter.convert_children(el));
            continue;
        }

        if el.is("div") && el.has_class("img_margin") {
            blocks.push(converter.convert_children(el));
            continue;
        }

        debug!("Skipping <{}> outside the question sections", el.tag);
    }

    blocks
        .into_iter()
        .filter(|b| !b.trim_ascii().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
