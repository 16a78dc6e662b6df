//! Split the extracted document text into translation-sized chunks.
//!
//! A paragraph boundary is either a blank-line run or a newline that directly
//! follows a period (a sentence that ends at a line end). Paragraphs are
//! packed greedily into chunks of at most `max_chars` characters, joined by
//! `\n`. A single paragraph longer than the bound is emitted on its own,
//! oversized; it is never cut mid-sentence.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default chunk bound, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 2000;

/// `.\n` (sentence end at a line end) or a blank-line run.
static RE_PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\n|\n\s*\n").expect("valid paragraph regex"));

/// Split `text` into trimmed, non-empty paragraphs.
///
/// The period of a `.\n` boundary stays with the paragraph it ends.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    for m in RE_PARAGRAPH_BREAK.find_iter(text) {
        let end = if m.as_str().starts_with('.') {
            m.start() + 1
        } else {
            m.start()
        };
        paragraphs.push(&text[start..end]);
        start = m.end();
    }
    paragraphs.push(&text[start..]);

    paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Pack the paragraphs of `text` into chunks of at most `max_chars` characters.
///
/// Lengths are counted in `char`s, and the `\n` joining two paragraphs counts
/// toward the bound. Returns no chunks for blank input.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for para in split_paragraphs(text) {
        let para_len = para.chars().count();
        if current.is_empty() {
            current.push_str(para);
            current_len = para_len;
        } else if current_len + 1 + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(para);
            current_len = para_len;
        } else {
            current.push('\n');
            current.push_str(para);
            current_len += 1 + para_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    const ESSAY: &str = "Utility is the measure of right and wrong.\n\
Bentham wrote that nature has placed mankind under two sovereign masters,\n\
pain and pleasure.\n\n\
Mill refined the view.   He distinguished higher\nand lower pleasures.\n\
\n   \n\
Kant rejected consequences as the ground of morality. The good will is good in itself.\n\
Duties bind regardless of inclination.";

    #[test]
    fn splits_on_period_newline_and_blank_lines() {
        let paras = split_paragraphs(ESSAY);
        assert_eq!(
            paras,
            vec![
                "Utility is the measure of right and wrong.",
                "Bentham wrote that nature has placed mankind under two sovereign masters,\npain and pleasure.",
                "Mill refined the view.   He distinguished higher\nand lower pleasures.",
                "Kant rejected consequences as the ground of morality. The good will is good in itself.",
                "Duties bind regardless of inclination.",
            ]
        );
    }

    #[test]
    fn newline_without_period_does_not_split() {
        assert_eq!(split_paragraphs("one line\ncontinues here"), vec!["one line\ncontinues here"]);
    }

    #[test]
    fn everything_fits_in_one_chunk() {
        let chunks = split_into_chunks(ESSAY, 10_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(words(&chunks[0]), words(ESSAY));
    }

    #[test]
    fn packs_paragraphs_greedily() {
        // "aaaa." + "\n" + "bbbb." = 11 chars fits in 11; adding "\ncccc." would not.
        let chunks = split_into_chunks("aaaa.\nbbbb.\ncccc.", 11);
        assert_eq!(chunks, vec!["aaaa.\nbbbb.", "cccc."]);
    }

    #[test]
    fn joiner_counts_toward_the_bound() {
        // 5 + 5 = 10 but with the joiner it is 11 > 10.
        let chunks = split_into_chunks("aaaa.\nbbbb.", 10);
        assert_eq!(chunks, vec!["aaaa.", "bbbb."]);
    }

    #[test]
    fn oversized_paragraph_is_its_own_chunk() {
        let long = "x".repeat(50);
        let text = format!("short.\n{long}\n\ntail.");
        let chunks = split_into_chunks(&text, 10);
        assert_eq!(chunks, vec!["short.".to_string(), long, "tail.".to_string()]);
    }

    #[test]
    fn oversized_first_paragraph_yields_no_empty_chunk() {
        let long = "y".repeat(30);
        let chunks = split_into_chunks(&long, 10);
        assert_eq!(chunks, vec![long]);
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        assert!(split_into_chunks("", 100).is_empty());
        assert!(split_into_chunks("\n\n  \n", 100).is_empty());
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Each paragraph is 4 chars but 12 bytes.
        let chunks = split_into_chunks("倫理学。\n\n経済学。", 9);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn properties_hold_across_bounds() {
        let text = ESSAY.repeat(7);
        for max in [1, 5, 40, 80, 150, 400, 2000] {
            let chunks = split_into_chunks(&text, max);
            let paragraphs = split_paragraphs(&text);

            // Nothing empty.
            assert!(chunks.iter().all(|c| !c.trim().is_empty()), "max={max}");

            // Content survives, in order, up to whitespace.
            assert_eq!(words(&chunks.join("\n")), words(&text), "max={max}");

            // Bound respected unless the chunk is one oversized paragraph.
            for c in &chunks {
                let len = c.chars().count();
                assert!(
                    len <= max || paragraphs.contains(&c.as_str()),
                    "max={max}: chunk of {len} chars is not a lone paragraph: {c:?}"
                );
            }
        }
    }
}
