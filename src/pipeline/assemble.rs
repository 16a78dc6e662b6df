//! Joining page texts and writing the translated `.docx`.

use crate::error::TranslateError;
use crate::output::PageText;
use docx_rs::{Docx, Paragraph, Run};
use std::io::Cursor;

/// Concatenate page texts in page order.
///
/// A page that starts a paragraph is preceded by `\n`; any other page is
/// glued to the previous one with a single space. Empty pages contribute
/// nothing. The result is trimmed.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut buffer = String::new();
    for page in pages.iter().filter(|p| !p.text.is_empty()) {
        buffer.push(if page.starts_paragraph { '\n' } else { ' ' });
        buffer.push_str(&page.text);
    }
    buffer.trim().to_string()
}

/// The paragraphs of the output document.
///
/// Translations are joined with a blank line, then every non-empty trimmed
/// line becomes one paragraph.
pub fn document_paragraphs(translations: &[String]) -> Vec<String> {
    translations
        .join("\n\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a `.docx` package with one paragraph per entry, in order.
pub fn build_docx(paragraphs: &[String]) -> Result<Vec<u8>, TranslateError> {
    let docx = paragraphs.iter().fold(Docx::new(), |docx, para| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(para)))
    });

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| TranslateError::DocumentBuildFailed(e.to_string()))?;
    Ok(cursor.into_inner())
}
