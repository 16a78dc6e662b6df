//! Result types returned by a translation run.

use serde::{Deserialize, Serialize};

/// Text extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Cleaned OCR output.
    pub text: String,
    /// Whether the page was joined to the buffer as a new paragraph.
    pub starts_paragraph: bool,
    /// OCR plus paragraph detection.
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Rate-limit / timeout retries spent on this page.
    pub retries: u32,
    pub duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// The concatenated source text, in page order.
    pub source_text: String,
    /// Per-page extraction results, in page order.
    pub pages: Vec<PageText>,
    /// The chunks sent for translation.
    pub chunks: Vec<String>,
    /// One translation per chunk, same order.
    pub translations: Vec<String>,
    /// The non-empty lines written to the document, one paragraph each.
    pub paragraphs: Vec<String>,
    /// The `.docx` package.
    #[serde(skip)]
    pub document: Vec<u8>,
    pub metadata: DocumentMetadata,
    pub stats: TranslationStats,
}

/// Counters and timings for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Pages rasterised and OCR'd.
    pub processed_pages: usize,
    pub chunks: usize,
    pub source_chars: usize,
    pub translated_chars: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Rate-limit / timeout retries across every call of the run.
    pub retries: u32,
    pub render_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document properties read from the PDF without rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
