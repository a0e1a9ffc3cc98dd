//! Post-processing: deterministic cleanup of converter-generated Markdown.
//!
//! `pdftohtml` marks every page with an empty named anchor and pads text with
//! non-breaking spaces; after the HTML → GFM conversion those survive as raw
//! HTML lines and odd spacing. The rules here remove that debris without
//! touching content. They are pure `&str → String` passes, so two runs over
//! the same input always produce the same bytes.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`;
//! anchors are removed before blank lines are collapsed, because removing an
//! anchor line leaves a blank line behind.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to converted Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Replace non-breaking spaces with plain spaces
/// 3. Remove lines that only hold empty page anchors
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive blank lines down to 2
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Ensure the file ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = replace_nbsp(&s);
    let s = remove_anchor_lines(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Non-breaking spaces ──────────────────────────────────────────────

fn replace_nbsp(input: &str) -> String {
    input.replace('\u{00A0}', " ").replace("&#160;", " ").replace("&nbsp;", " ")
}

// ── Rule 3: Empty page anchors ───────────────────────────────────────────────

// `<a name="3"></a>`, `<a id="p3"></a>`, `<span id="3"></span>`, possibly
// several on one line.
static RE_ANCHOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:\s*<(a|span)\s+(?:name|id)="?[^">]*"?\s*>\s*</(?:a|span)>\s*)+$"#).unwrap()
});

fn remove_anchor_lines(input: &str) -> String {
    input
        .lines()
        .map(|line| if RE_ANCHOR_LINE.is_match(line) { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 7: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
