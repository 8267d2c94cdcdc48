//! The HTML → Markdown tree walk.
//!
//! A single depth-first pass over an [`Element`] tree. Each node kind maps to
//! one output construct; anything unrecognised is unwrapped and its children
//! converted in place, so no text is lost. Output order follows source order
//! exactly.
//!
//! | Source | Output |
//! |--------|--------|
//! | text | whitespace runs collapsed to one space |
//! | `.bb` blank | `<u>&emsp;x&emsp;</u>` |
//! | `<u>` | `<u>x</u>` |
//! | `p`, `div`, `br`, … | content + one blank line |
//! | `ol` / `ul` | `1.` / `-` items, two spaces per nesting level |
//! | `img` | centered `![alt](assets/…)` in a white `<div>` |
//! | `table` | GFM pipe table |

use crate::pipeline::assets::AssetResolver;
use crate::pipeline::dom::{Element, HtmlNode};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, warn};

/// Characters per list nesting level.
const INDENT_UNIT: &str = "  ";

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "blockquote", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "center", "dl", "dt", "dd", "pre", "address", "li", "form", "fieldset",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "head"];

static RE_LI_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^li(\d+)$").unwrap());
static RE_MARU_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^maru(\d+)$").unwrap());

/// Transient state of one conversion call.
#[derive(Debug, Clone, Default)]
pub struct ConversionContext {
    /// Number of list ancestors of the node being converted.
    pub depth: usize,
    /// Inside a fill-in-blank span.
    pub in_blank: bool,
    /// Inside `<u>`.
    pub in_underline: bool,
    /// Inside a table cell.
    pub in_cell: bool,
}

impl ConversionContext {
    /// Output must stay on one line: block breaks degrade to spaces.
    fn is_inline(&self) -> bool {
        self.in_blank || self.in_underline || self.in_cell
    }
}

/// Converts question trees to Markdown, registering images with an
/// [`AssetResolver`] as it meets them.
pub struct NodeConverter<'a> {
    assets: &'a mut AssetResolver,
    base_url: Option<&'a Url>,
    blank_class: &'a str,
}

impl<'a> NodeConverter<'a> {
    pub fn new(assets: &'a mut AssetResolver, base_url: Option<&'a Url>) -> Self {
        Self {
            assets,
            base_url,
            blank_class: crate::config::DEFAULT_BLANK_CLASS,
        }
    }

    pub fn with_blank_class(mut self, class: &'a str) -> Self {
        self.blank_class = class;
        self
    }

    /// Convert `node` itself (wrapper included).
    pub fn convert(&mut self, node: &HtmlNode) -> String {
        let mut ctx = ConversionContext::default();
        let mut out = MarkdownWriter::default();
        self.walk(node, &mut ctx, &mut out);
        out.finish()
    }

    /// Convert the children of `el`, dropping `el`'s own tag.
    pub fn convert_children(&mut self, el: &Element) -> String {
        let mut ctx = ConversionContext::default();
        let mut out = MarkdownWriter::default();
        self.walk_children(el, &mut ctx, &mut out);
        out.finish()
    }

    fn walk_children(&mut self, el: &Element, ctx: &mut ConversionContext, out: &mut MarkdownWriter) {
        for child in &el.children {
            self.walk(child, ctx, out);
        }
    }

    fn walk(&mut self, node: &HtmlNode, ctx: &mut ConversionContext, out: &mut MarkdownWriter) {
        let el = match node {
            HtmlNode::Text(text) => {
                out.push_text(text);
                return;
            }
            HtmlNode::Element(el) => el,
        };

        if el.has_class(self.blank_class) {
            let saved = ctx.in_blank;
            ctx.in_blank = true;
            let inner = self.convert_nested(el, ctx);
            ctx.in_blank = saved;
            out.push_raw(&format!("<u>&emsp;{inner}&emsp;</u>"));
            return;
        }

        match el.tag.as_str() {
            "u" => {
                let saved = ctx.in_underline;
                ctx.in_underline = true;
                let inner = self.convert_nested(el, ctx);
                ctx.in_underline = saved;
                out.push_raw(&format!("<u>{inner}</u>"));
            }
            "br" => out.block_break(ctx.is_inline()),
            "hr" => out.push_block("---", ctx.is_inline()),
            "ol" | "ul" => {
                let list = self.list(el, ctx);
                out.push_block(&list, ctx.is_inline());
            }
            "img" => {
                if let Some(image) = self.image(el, ctx) {
                    out.push_block(&image, ctx.is_inline());
                }
            }
            "table" => {
                let table = self.table(el, ctx);
                out.push_block(&table, ctx.is_inline());
            }
            tag if heading_level(tag).is_some() => {
                let level = heading_level(tag).unwrap_or(1);
                let saved = ctx.in_cell;
                ctx.in_cell = true;
                let inner = self.convert_nested(el, ctx);
                ctx.in_cell = saved;
                if !inner.is_empty() {
                    out.push_block(&format!("{} {}", "#".repeat(level), inner), ctx.is_inline());
                }
            }
            tag if BLOCK_TAGS.contains(&tag) => {
                out.block_break(ctx.is_inline());
                self.walk_children(el, ctx, out);
                out.block_break(ctx.is_inline());
            }
            tag if SKIPPED_TAGS.contains(&tag) => {
                debug!("Skipping <{}>", tag);
            }
            _ => self.walk_children(el, ctx, out),
        }
    }

    /// Convert children into a fresh buffer, trimmed.
    fn convert_nested(&mut self, el: &Element, ctx: &mut ConversionContext) -> String {
        let mut inner = MarkdownWriter::default();
        self.walk_children(el, ctx, &mut inner);
        inner.finish().trim_ascii().to_string()
    }

    // ── Lists ─────────────────────────────────────────────────────────────

    fn list(&mut self, list: &Element, ctx: &mut ConversionContext) -> String {
        let ordered = list.is("ol");
        let indent = INDENT_UNIT.repeat(ctx.depth);
        let mut number = if ordered {
            list.attr("start")
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(1)
        } else {
            1
        };

        let mut items: Vec<String> = Vec::new();
        for child in &list.children {
            let li = match child {
                HtmlNode::Element(e) if e.is("li") => e,
                HtmlNode::Element(e) if is_list(e) => {
                    // <ul><li>..</li><ul>..</ul></ul>: attach to the previous item.
                    ctx.depth += 1;
                    let nested = self.list(e, ctx);
                    ctx.depth -= 1;
                    match items.last_mut() {
                        Some(last) if !nested.is_empty() => {
                            last.push('\n');
                            last.push_str(&nested);
                        }
                        None if !nested.is_empty() => items.push(nested),
                        _ => {}
                    }
                    continue;
                }
                HtmlNode::Element(e) => {
                    debug!("Unwrapping <{}> directly inside <{}>", e.tag, list.tag);
                    let stray = self.convert_nested(e, ctx);
                    if !stray.is_empty() {
                        items.push(format!("{indent}{stray}"));
                    }
                    continue;
                }
                HtmlNode::Text(_) => continue,
            };

            let value = li.attr("value").and_then(|v| v.trim().parse::<i64>().ok());
            let n = value.unwrap_or(number);
            if ordered {
                number = n + 1;
            }
            let marker = list_marker(list, li, n);
            items.push(self.list_item(li, &indent, &marker, ctx));
        }

        items.join("\n")
    }

    fn list_item(
        &mut self,
        li: &Element,
        indent: &str,
        marker: &str,
        ctx: &mut ConversionContext,
    ) -> String {
        let mut item = format!("{indent}{marker} ");
        let continuation = INDENT_UNIT.repeat(ctx.depth + 1);
        let mut after_nested = false;
        let mut run = MarkdownWriter::default();

        ctx.depth += 1;
        for child in &li.children {
            match child {
                HtmlNode::Element(e) if is_list(e) => {
                    let text = std::mem::take(&mut run).finish();
                    append_item_text(&mut item, &text, after_nested, &continuation);
                    let nested = self.list(e, ctx);
                    if !nested.is_empty() {
                        item.push('\n');
                        item.push_str(&nested);
                        after_nested = true;
                    }
                }
                _ => self.walk(child, ctx, &mut run),
            }
        }
        ctx.depth -= 1;

        let text = run.finish();
        append_item_text(&mut item, &text, after_nested, &continuation);
        item
    }

    // ── Images ────────────────────────────────────────────────────────────

    fn image(&mut self, img: &Element, ctx: &ConversionContext) -> Option<String> {
        let src = img.attr("src").map(str::trim).unwrap_or("");
        let target = match (src.is_empty(), self.base_url) {
            (true, _) => String::new(),
            (false, Some(base)) => base
                .join(src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.to_string()),
            (false, None) => src.to_string(),
        };

        let resolution = match self.assets.resolve(&target) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping image: {}", e);
                return None;
            }
        };
        if !resolution.is_new {
            debug!("Image {} already resolved", target);
        }

        let alt = collapse_whitespace(img.attr("alt").unwrap_or(""))
            .trim_ascii()
            .replace(['[', ']'], "");
        let reference = format!("![{}]({})", alt, resolution.relative_path);
        if ctx.is_inline() {
            return Some(reference);
        }
        Some(format!(
            "<div style=\"text-align: center; background-color: white;\">\n\n{reference}\n\n</div>"
        ))
    }

    // ── Tables ────────────────────────────────────────────────────────────

    fn table(&mut self, table: &Element, ctx: &mut ConversionContext) -> String {
        let mut rows: Vec<&Element> = Vec::new();
        let mut captions: Vec<&Element> = Vec::new();
        collect_rows(table, &mut rows, &mut captions);

        let saved = ctx.in_cell;
        ctx.in_cell = true;

        let mut lines: Vec<String> = Vec::new();
        for caption in captions {
            let text = self.convert_nested(caption, ctx);
            if !text.is_empty() {
                lines.push(text);
                lines.push(String::new());
            }
        }

        let mut header_cols: Option<usize> = None;
        for row in rows {
            let cells: Vec<String> = row
                .child_elements()
                .filter(|c| c.is("td") || c.is("th"))
                .map(|cell| {
                    let text = self.convert_nested(cell, ctx);
                    collapse_whitespace(&text).trim_ascii().replace('|', "\\|")
                })
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
            if header_cols.is_none() {
                let cols = cells.len().max(1);
                header_cols = Some(cols);
                lines.push(format!("|{}", "---|".repeat(cols)));
            }
        }
        ctx.in_cell = saved;

        if header_cols.is_none() {
            // A table without rows: keep only its caption text.
            return lines
                .into_iter()
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
        }
        lines.join("\n")
    }
}

// ── Output buffer ────────────────────────────────────────────────────────

/// Accumulates Markdown while enforcing the spacing rules: no leading space
/// at the start of a line and never more than one empty line in a row.
#[derive(Debug, Default)]
struct MarkdownWriter {
    buf: String,
}

impl MarkdownWriter {
    fn at_line_start(&self) -> bool {
        self.buf.is_empty() || self.buf.ends_with('\n')
    }

    fn push_text(&mut self, text: &str) {
        let collapsed = collapse_whitespace(text);
        let mut s = collapsed.as_str();
        if self.at_line_start() || self.buf.ends_with(' ') {
            s = s.trim_start_matches(' ');
        }
        self.buf.push_str(s);
    }

    fn push_raw(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// End the current block with exactly one blank line.
    fn block_break(&mut self, inline: bool) {
        if inline {
            if !self.at_line_start() && !self.buf.ends_with(' ') {
                self.buf.push(' ');
            }
            return;
        }
        let trimmed = self.buf.trim_end_matches([' ', '\t', '\n']).len();
        self.buf.truncate(trimmed);
        if !self.buf.is_empty() {
            self.buf.push_str("\n\n");
        }
    }

    fn push_block(&mut self, block: &str, inline: bool) {
        if block.is_empty() {
            return;
        }
        self.block_break(inline);
        self.buf.push_str(block);
        self.block_break(inline);
    }

    fn finish(self) -> String {
        self.buf
            .trim_end_matches([' ', '\t', '\n'])
            .trim_start_matches('\n')
            .to_string()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn is_list(el: &Element) -> bool {
    el.is("ol") || el.is("ul")
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Collapse runs of ASCII whitespace to a single space. Non-ASCII spacing
/// (U+3000, U+00A0) is content and kept.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Append a run of item text. Every line after the item's first line is
/// indented to the item's content column; lists converted inside the run
/// already carry that indentation.
fn append_item_text(item: &mut String, text: &str, after_nested: bool, continuation: &str) {
    if text.is_empty() {
        return;
    }
    let mut lines = text.lines();
    if !after_nested {
        if let Some(first) = lines.next() {
            item.push_str(first);
        }
    }
    for line in lines {
        item.push('\n');
        if line.is_empty() {
            continue;
        }
        if !line.starts_with(continuation) {
            item.push_str(continuation);
        }
        item.push_str(line);
    }
}

fn collect_rows<'t>(el: &'t Element, rows: &mut Vec<&'t Element>, captions: &mut Vec<&'t Element>) {
    for child in el.child_elements() {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "caption" => captions.push(child),
            // Nested tables are converted inside their cell.
            "table" => {}
            _ => collect_rows(child, rows, captions),
        }
    }
}

/// Kana option classes used for answer choices.
fn kana_marker(class: &str) -> Option<&'static str> {
    Some(match class {
        "lia" => "ア",
        "lii" => "イ",
        "liu" => "ウ",
        "lie" => "エ",
        "lio" => "オ",
        "lika" => "カ",
        "liki" => "キ",
        "liku" => "ク",
        "like" => "ケ",
        "liko" => "コ",
        _ => return None,
    })
}

fn circled_number(n: i64) -> String {
    if (1..=20).contains(&n) {
        // ① is U+2460; ①..⑳ are contiguous.
        char::from_u32(0x2460 + (n as u32) - 1)
            .map(String::from)
            .unwrap_or_else(|| format!("({n})"))
    } else {
        format!("({n})")
    }
}

/// Marker for one item: class-based markers first, then `type="a"`, then the
/// plain `N.` / `-`.
fn list_marker(list: &Element, li: &Element, n: i64) -> String {
    let mut class_number = None;
    let mut maru_number = None;
    for class in li.classes() {
        if let Some(kana) = kana_marker(class) {
            return format!("{kana}、");
        }
        if let Some(caps) = RE_LI_NUMBER.captures(class) {
            class_number = caps[1].parse::<i64>().ok();
        } else if let Some(caps) = RE_MARU_NUMBER.captures(class) {
            maru_number = caps[1].parse::<i64>().ok();
        }
    }
    if let Some(m) = maru_number {
        return circled_number(m);
    }
    if let Some(c) = class_number {
        return format!("({c})");
    }

    if list.is("ol") {
        let list_type = list.attr("type").map(str::trim).unwrap_or("");
        if list_type.eq_ignore_ascii_case("a") && (1..=26).contains(&n) {
            let base = if list_type == "A" { b'A' } else { b'a' };
            return format!("{}.", (base + (n as u8) - 1) as char);
        }
        return format!("{n}.");
    }
    "-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse::parse_fragment;

    fn md(html: &str) -> String {
        let mut assets = AssetResolver::new("assets");
        let root = parse_fragment(html);
        NodeConverter::new(&mut assets, None).convert_children(&root)
    }

    fn md_with_assets(html: &str, base: &str) -> (String, AssetResolver) {
        let mut assets = AssetResolver::new("assets");
        let base = Url::parse(base).unwrap();
        let root = parse_fragment(html);
        let out = NodeConverter::new(&mut assets, Some(&base)).convert_children(&root);
        (out, assets)
    }

    // ── Text ──────────────────────────────────────────────────────────────

    #[test]
    fn text_whitespace_collapses() {
        assert_eq!(md("a  \n\t b"), "a b");
    }

    #[test]
    fn multibyte_text_is_kept() {
        assert_eq!(md("<p>午後　問４ (¥100)</p>"), "午後　問４ (¥100)");
    }

    #[test]
    fn markdown_characters_are_not_escaped() {
        assert_eq!(md("<p>a*b_c [d]</p>"), "a*b_c [d]");
    }

    // ── Blanks and underline ──────────────────────────────────────────────

    #[test]
    fn blank_span() {
        assert_eq!(md(r#"<span class="bb">A</span>"#), "<u>&emsp;A&emsp;</u>");
    }

    #[test]
    fn empty_blank_span() {
        assert_eq!(md(r#"<span class="bb"></span>"#), "<u>&emsp;&emsp;</u>");
    }

    #[test]
    fn blank_inside_sentence() {
        assert_eq!(
            md(r#"Text with <span class="bb">a</span> blank"#),
            "Text with <u>&emsp;a&emsp;</u> blank"
        );
    }

    #[test]
    fn underline_preserved() {
        assert_eq!(
            md("<div>Text with <u>underlined content</u> here</div>"),
            "Text with <u>underlined content</u> here"
        );
    }

    #[test]
    fn underline_and_blank_nest_both_ways() {
        assert_eq!(
            md(r#"<u>x <span class="bb">b</span></u>"#),
            "<u>x <u>&emsp;b&emsp;</u></u>"
        );
        assert_eq!(
            md(r#"<span class="bb"><u>c</u></span>"#),
            "<u>&emsp;<u>c</u>&emsp;</u>"
        );
    }

    #[test]
    fn ideographic_space_kept_inside_blank_and_underline() {
        assert_eq!(
            md("<span class=\"bb\">\u{3000}ア\u{3000}</span>|<u>\u{3000}x</u>"),
            "<u>&emsp;\u{3000}ア\u{3000}&emsp;</u>|<u>\u{3000}x</u>"
        );
        assert_eq!(md("<u>x\u{a0}</u>"), "<u>x\u{a0}</u>");
    }

    #[test]
    fn break_inside_blank_stays_inline() {
        assert_eq!(md(r#"<span class="bb">a<br>b</span>"#), "<u>&emsp;a b&emsp;</u>");
    }

    #[test]
    fn custom_blank_class() {
        let mut assets = AssetResolver::new("assets");
        let root = parse_fragment(r#"<span class="blank">x</span><span class="bb">y</span>"#);
        let out = NodeConverter::new(&mut assets, None)
            .with_blank_class("blank")
            .convert_children(&root);
        assert_eq!(out, "<u>&emsp;x&emsp;</u>y");
    }

    // ── Paragraphs ────────────────────────────────────────────────────────

    #[test]
    fn paragraphs_separated_by_one_blank_line() {
        assert_eq!(md("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn consecutive_breaks_never_stack() {
        assert_eq!(md("a<br><br><br><p></p><div><br></div>b"), "a\n\nb");
    }

    #[test]
    fn br_separates_lines() {
        assert_eq!(
            md(r#"Text <span class="bb">a</span><br>
      <ul><li>Option</li></ul>"#),
            "Text <u>&emsp;a&emsp;</u>\n\n- Option"
        );
    }

    #[test]
    fn blank_line_before_and_after_list() {
        assert_eq!(
            md("<div>Text line<ul><li>List Item</li></ul>Following text</div>"),
            "Text line\n\n- List Item\n\nFollowing text"
        );
    }

    #[test]
    fn headings_get_hashes() {
        assert_eq!(md("<h4>設問1</h4><p>body</p>"), "#### 設問1\n\nbody");
    }

    // ── Lists ─────────────────────────────────────────────────────────────

    #[test]
    fn nested_ordered_list_scenario() {
        assert_eq!(
            md("<ol><li>one</li><li><ol><li>nested</li></ol></li></ol>"),
            "1. one\n2. \n  1. nested"
        );
    }

    #[test]
    fn nested_list_under_text() {
        let html = "
            <ul>
                <li>Item 1
                    <ol>
                        <li>Nested 1</li>
                        <li>Nested 2</li>
                    </ol>
                </li>
                <li>Item 2</li>
            </ul>";
        assert_eq!(md(html), "- Item 1\n  1. Nested 1\n  2. Nested 2\n- Item 2");
    }

    #[test]
    fn indentation_is_two_spaces_per_level() {
        for depth in 0..=5 {
            let mut html = String::new();
            for _ in 0..=depth {
                html.push_str("<ul><li>");
            }
            html.push_str("leaf");
            for _ in 0..=depth {
                html.push_str("</li></ul>");
            }
            let out = md(&html);
            let leaf = out.lines().find(|l| l.contains("leaf")).unwrap();
            assert_eq!(leaf, format!("{}- leaf", " ".repeat(2 * depth)), "depth {depth}");
        }
    }

    #[test]
    fn numbering_restarts_per_list() {
        assert_eq!(
            md("<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol>"),
            "1. a\n2. b\n\n1. c"
        );
    }

    #[test]
    fn blank_inside_list_item() {
        assert_eq!(
            md(r#"<ul><li>Text with <span class="bb">a</span> blank</li></ul>"#),
            "- Text with <u>&emsp;a&emsp;</u> blank"
        );
    }

    #[test]
    fn start_and_value_attributes() {
        assert_eq!(
            md(r#"<ol start="3"><li>c</li><li value="7">g</li><li>h</li></ol>"#),
            "3. c\n7. g\n8. h"
        );
    }

    #[test]
    fn alpha_ordered_list() {
        assert_eq!(md(r#"<ol type="a"><li>Alpha</li><li>Beta</li></ol>"#), "a. Alpha\nb. Beta");
        assert_eq!(
            md(r#"<ol type="A"><li value="5">Fifth</li><li>Sixth</li></ol>"#),
            "E. Fifth\nF. Sixth"
        );
    }

    #[test]
    fn class_markers() {
        assert_eq!(
            md(r#"<ul><li class="li1">Case one</li><li class="li2">Case two</li></ul>"#),
            "(1) Case one\n(2) Case two"
        );
        assert_eq!(
            md(r#"<ol><li class="maru1">Alpha</li><li class="maru21">Beta</li></ol>"#),
            "① Alpha\n(21) Beta"
        );
        assert_eq!(
            md(r#"<ul><li class="lia">Option A</li><li class="lii">Option B</li></ul>"#),
            "ア、 Option A\nイ、 Option B"
        );
    }

    #[test]
    fn text_after_nested_list_is_indented() {
        assert_eq!(
            md("<ul><li>head<ul><li>x</li></ul>tail</li></ul>"),
            "- head\n  - x\n  tail"
        );
    }

    #[test]
    fn break_inside_item_stays_in_item() {
        assert_eq!(md("<ol><li>a<br>b</li><li>c</li></ol>"), "1. a\n\n  b\n2. c");
    }

    #[test]
    fn paragraphs_inside_nested_item_stay_indented() {
        assert_eq!(
            md("<ul><li>x<ul><li><p>y</p><p>z</p></li></ul></li></ul>"),
            "- x\n  - y\n\n    z"
        );
    }

    #[test]
    fn image_inside_nested_item_is_indented() {
        let (out, _) = md_with_assets(
            r#"<ul><li>図を選べ<ul><li class="lia"><img src="p.png"></li></ul></li></ul>"#,
            "https://example.com/q/",
        );
        assert_eq!(
            out,
            "- 図を選べ\n  ア、 <div style=\"text-align: center; background-color: white;\">\n\n    \
             ![](assets/p.png)\n\n    </div>"
        );
    }

    #[test]
    fn list_inside_item_block_not_double_indented() {
        assert_eq!(
            md("<ul><li>a<div><ul><li>b</li></ul></div></li></ul>"),
            "- a\n\n  - b"
        );
    }

    #[test]
    fn stray_nested_list_attaches_to_previous_item() {
        assert_eq!(md("<ul><li>a</li><ul><li>b</li></ul></ul>"), "- a\n  - b");
    }

    // ── Images ────────────────────────────────────────────────────────────

    #[test]
    fn image_is_centered_with_white_background() {
        let (out, assets) = md_with_assets(r#"<img src="https://x/y/z.png" alt="図1">"#, "https://x/q/");
        assert_eq!(
            out,
            "<div style=\"text-align: center; background-color: white;\">\n\n![図1](assets/z.png)\n\n</div>"
        );
        assert_eq!(assets.records().len(), 1);
        assert_eq!(assets.records()[0].source_url, "https://x/y/z.png");
    }

    #[test]
    fn relative_src_is_joined_with_page_url() {
        let (out, assets) = md_with_assets(r#"<img src="img/sample.png">"#, "https://example.com/base/q.html");
        assert!(out.contains("](assets/sample.png)"));
        assert_eq!(assets.records()[0].source_url, "https://example.com/base/img/sample.png");
    }

    #[test]
    fn repeated_image_resolved_once() {
        let (out, assets) = md_with_assets(
            r#"<p><img src="a.png"></p><p><img src="a.png"></p>"#,
            "https://example.com/q/",
        );
        assert_eq!(out.matches("](assets/a.png)").count(), 2);
        assert_eq!(assets.records().len(), 1);
    }

    #[test]
    fn images_keep_source_order() {
        let (out, assets) = md_with_assets(
            r#"<img src="b.png"><p>t</p><img src="a.png">"#,
            "https://example.com/",
        );
        let b = out.find("assets/b.png").unwrap();
        let a = out.find("assets/a.png").unwrap();
        assert!(b < a);
        let names: Vec<_> = assets.records().iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.png"]);
    }

    #[test]
    fn image_without_src_is_skipped() {
        let (out, assets) = md_with_assets(r#"before<img alt="x">after"#, "https://example.com/");
        assert_eq!(out, "beforeafter");
        assert!(assets.records().is_empty());
    }

    #[test]
    fn image_inside_blank_stays_inline() {
        let (out, _) = md_with_assets(r#"<span class="bb"><img src="s.gif"></span>"#, "https://e/");
        assert_eq!(out, "<u>&emsp;![](assets/s.gif)&emsp;</u>");
    }

    // ── Tables ────────────────────────────────────────────────────────────

    #[test]
    fn table_with_header_separator() {
        let html = "<table><tr><th>Name</th><th>Value</th></tr>\
                    <tr><td>a</td><td>1</td></tr><tr><td>b</td><td>2</td></tr></table>";
        assert_eq!(
            md(html),
            "| Name | Value |\n|---|---|\n| a | 1 |\n| b | 2 |"
        );
    }

    #[test]
    fn table_cells_are_single_line() {
        let html = "<table><tbody><tr><td><p>line 1</p><p>line 2</p></td><td>x<br>y</td></tr></tbody></table>";
        assert_eq!(md(html), "| line 1 line 2 | x y |\n|---|---|");
    }

    #[test]
    fn table_cell_pipes_are_escaped() {
        assert_eq!(md("<table><tr><td>a|b</td></tr></table>"), "| a\\|b |\n|---|");
    }

    #[test]
    fn table_separated_from_text() {
        assert_eq!(
            md("<p>before</p><table><tr><td>c</td></tr></table>after"),
            "before\n\n| c |\n|---|\n\nafter"
        );
    }

    // ── Unknown tags and determinism ──────────────────────────────────────

    #[test]
    fn unknown_tags_are_unwrapped() {
        assert_eq!(
            md("<custom-tag><em>keep</em> <a href='#'>me</a></custom-tag>"),
            "keep me"
        );
    }

    #[test]
    fn scripts_are_dropped() {
        assert_eq!(md("<p>x</p><script>var a = 1;</script>"), "x");
    }

    #[test]
    fn conversion_is_deterministic() {
        let html = r#"<div><p>Q <span class="bb">a</span></p><ol><li>x<ul><li>y</li></ul></li></ol>
            <table><tr><td>1</td></tr></table><img src="https://e/i.png"></div>"#;
        let first = md(html);
        for _ in 0..5 {
            assert_eq!(md(html), first);
        }
    }

    #[test]
    fn convert_keeps_wrapper_semantics() {
        let mut assets = AssetResolver::new("assets");
        let node = HtmlNode::from(
            Element::new("span")
                .with_attr("class", "bb")
                .with_child(HtmlNode::text(" ア ")),
        );
        assert_eq!(NodeConverter::new(&mut assets, None).convert(&node), "<u>&emsp;ア&emsp;</u>");
    }
}
