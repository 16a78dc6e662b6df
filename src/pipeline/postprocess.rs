//! Deterministic cleanup of OCR output.
//!
//! Vision models asked for "the exact text" still wrap it in code fences now
//! and then, answer with CRLF line endings, or leak zero-width characters
//! from the PDF's text layer. None of that should reach the chunker, whose
//! paragraph detection keys on newlines. Each rule is a pure `&str → String`
//! pass; [`clean_text`] runs them in a fixed order.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw OCR answer.
///
/// Rules (applied in order):
/// 1. Strip an outer ```` ``` ```` / ```` ```text ```` fence
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of 3+ blank lines to a single blank line
/// 6. Trim the whole text
pub fn clean_text(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer fences ───────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:text|plaintext|markdown|md)?\r?\n(.*)\r?\n```\s*$")
        .expect("valid fence regex")
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_text_fence() {
        let raw = "```text\nFirst line.\nSecond line.\n```";
        assert_eq!(clean_text(raw), "First line.\nSecond line.");
    }

    #[test]
    fn leaves_inner_fences_alone() {
        let raw = "Intro.\n```\ncode\n```\nOutro.";
        assert_eq!(clean_text(raw), raw);
    }

    #[test]
    fn normalises_crlf_and_trailing_spaces() {
        assert_eq!(clean_text("a.  \r\nb\rc"), "a.\nb\nc");
    }

    #[test]
    fn removes_invisible_characters() {
        assert_eq!(clean_text("\u{FEFF}eth\u{00AD}ics\u{200B}"), "ethics");
    }

    #[test]
    fn collapses_blank_runs_but_keeps_paragraph_breaks() {
        assert_eq!(clean_text("one\n\n\n\n\ntwo\n\nthree"), "one\n\ntwo\n\nthree");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(clean_text(" \n\t\n "), "");
    }
}
