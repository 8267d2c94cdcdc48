//! Post-processing: deterministic cleanup of the assembled Markdown.
//!
//! The converter already controls spacing inside each section; these rules
//! normalise what section assembly and odd source markup can still leave
//! behind. Each rule is a pure `&str → String` function.
//!
//! Rules must run in this order: line endings before trimming, trimming
//! before blank-line collapsing, and the final-newline pass last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to a page's Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Trim trailing spaces and tabs per line (an empty list item keeps `marker `)
/// 3. Collapse 2+ consecutive blank lines down to 1
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 5. Ensure the file ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Trim trailing whitespace per line ────────────────────────────────

// Marker of a list item with no text of its own, e.g. `2.` or `  ア、`.
static RE_EMPTY_LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ *(?:\d+\.|[-*+]|[a-zA-Z]\.|\(\d+\)|[①-⑳]|\p{Katakana}、)$").unwrap()
});

// Only ASCII blanks: a trailing U+3000 is deliberate spacing in Japanese text.
fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() < line.len() && RE_EMPTY_LIST_ITEM.is_match(trimmed) {
                format!("{trimmed} ")
            } else {
                trimmed.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 5: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input
        .trim_start_matches('\n')
        .trim_end_matches('\n');
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
