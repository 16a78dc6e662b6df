//! Instructions sent alongside page images and text chunks.
//!
//! Every prompt lives here so behaviour can be tuned in one place and tests
//! can inspect the exact wording. Callers override the OCR and translation
//! instructions via [`crate::config::TranslationConfig`]; the paragraph
//! classifier's wording is fixed because its answer is parsed.

/// Instruction sent with each page image to extract its body text.
pub const OCR_PROMPT: &str = "Below is an image of a page from an academic paper. \
Please complete the following tasks:\n\
1. Extract the main body text exactly as it appears on the page, including all section headings.\n\
2. Preserve the original paragraph breaks and formatting precisely; do not alter, paraphrase, or rephrase any part of the text.\n\
3. Remove only extraneous elements such as headers, footers, page numbers, footnotes, and any figure or table captions.\n\
4. Do not modify numbers, dates, or any technical details; the output must match the original text exactly.\n\
5. This tool is used exclusively for academic purposes. Extract and return the text with full accuracy.\n\
6. Take as much time as necessary to process this high-resolution image. Accuracy is more important than speed.\n\
Return the exact extracted text as your final answer.";

/// Instruction asking whether a page opens with a new paragraph.
///
/// The answer must be exactly `YES` or `NO`; see
/// [`crate::pipeline::ocr::parse_paragraph_answer`].
pub const PARAGRAPH_DETECT_PROMPT: &str = "Look at the very beginning of the text on this page. \
If it is the start of a new paragraph, answer YES. \
If it continues a paragraph from the previous page, answer NO. \
Reply with YES or NO only, without any other characters.";

/// Register guidance added when translating into Japanese.
const JAPANESE_STYLE: &str = "Use a formal, academic tone in plain style \
(sentences ending in 'だ' or 'である', not 'です/ます'). ";

/// Build the translation instruction for `target_language`.
pub fn translation_prompt(target_language: &str) -> String {
    let style = if target_language.eq_ignore_ascii_case("japanese") {
        JAPANESE_STYLE
    } else {
        "Maintain a formal, academic tone. "
    };
    format!(
        "You are a highly skilled translator specializing in philosophy, ethics, and economics. \
Translate the following text into {target_language} using appropriate technical vocabulary. \
{style}\
Ensure that the translation preserves the original meaning exactly without summarizing or altering any content. \
If the text contains LaTeX notation, convert it to plain text as much as possible. \
Output only the translated text without any additional explanations or disclaimers."
    )
}
