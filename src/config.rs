//! Configuration types for PDF translation.
//!
//! All run behaviour is controlled through [`TranslationConfig`], built via
//! its [`TranslationConfigBuilder`]. Setters clamp obviously out-of-range
//! values; [`TranslationConfigBuilder::build`] rejects the rest.

use crate::error::TranslateError;
use crate::model::GenerativeModel;
use crate::pipeline::chunk::DEFAULT_MAX_CHUNK_CHARS;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for a PDF-to-Word translation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf_translate::{PageJoin, TranslationConfig};
///
/// let config = TranslationConfig::builder()
///     .dpi(200)
///     .max_chunk_chars(1500)
///     .page_join(PageJoin::NewParagraph)
///     .target_language("German")
///     .output_suffix("_de")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chunk_chars, 1500);
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 3000.
    ///
    /// Caps the longest edge independently of DPI so oversized pages (posters,
    /// A0 drawings) cannot exhaust memory or exceed upload limits.
    pub max_rendered_pixels: u32,

    /// Pages OCR'd at once. Default: 1.
    ///
    /// Results are always re-assembled in page order. Translation calls are
    /// sequential regardless of this value.
    pub concurrency: usize,

    /// Model identifier. If None, [`DEFAULT_MODEL`] for Gemini.
    pub model: Option<String>,

    /// Provider name: "gemini" (native client) or any edgequake-llm provider
    /// ("openai", "anthropic", "ollama", …). If None, Gemini.
    pub provider_name: Option<String>,

    /// Pre-constructed model client. Takes precedence over `provider_name`.
    pub model_client: Option<Arc<dyn GenerativeModel>>,

    /// API key for the Gemini client. Falls back to `GEMINI_API_KEY` /
    /// `GOOGLE_API_KEY` when None.
    pub api_key: Option<String>,

    /// Sampling temperature for OCR calls. Default: 0.0.
    pub ocr_temperature: f32,

    /// Output-token cap per OCR call. Default: 2048.
    pub ocr_max_tokens: usize,

    /// Output-token cap for the paragraph-start classifier. Default: 16.
    pub detect_max_tokens: usize,

    /// Sampling temperature for translation calls. Default: 0.7.
    pub translate_temperature: f32,

    /// Output-token cap per translation call. Default: 5000.
    pub translate_max_tokens: usize,

    /// Approximate upper bound on a chunk, in characters. Default: 2000.
    pub max_chunk_chars: usize,

    /// Retries per call on a rate-limit or timeout. Default: 2.
    pub max_retries: u32,

    /// Fixed delay between retries in milliseconds. Default: 5000.
    ///
    /// A `Retry-After` hint from the server replaces this value for that attempt.
    pub retry_delay_ms: u64,

    /// Pause between consecutive translation calls in milliseconds. Default: 1000.
    pub translate_delay_ms: u64,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// How each page's text is joined to the running buffer. Default: [`PageJoin::DetectParagraphs`].
    pub page_join: PageJoin,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Language the document is translated into. Default: "Japanese".
    pub target_language: String,

    /// Suffix appended to the source file stem for the output name. Default: "_ja".
    pub output_suffix: String,

    /// Custom OCR instruction. If None, uses [`crate::prompts::OCR_PROMPT`].
    pub ocr_prompt: Option<String>,

    /// Custom translation instruction. If None, built from `target_language`.
    pub translation_prompt: Option<String>,

    /// Receives stage, page and chunk events while the run progresses.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 3000,
            concurrency: 1,
            model: None,
            provider_name: None,
            model_client: None,
            api_key: None,
            ocr_temperature: 0.0,
            ocr_max_tokens: 2048,
            detect_max_tokens: 16,
            translate_temperature: 0.7,
            translate_max_tokens: 5000,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            max_retries: 2,
            retry_delay_ms: 5000,
            translate_delay_ms: 1000,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            page_join: PageJoin::default(),
            pages: PageSelection::default(),
            password: None,
            target_language: "Japanese".to_string(),
            output_suffix: "_ja".to_string(),
            ocr_prompt: None,
            translation_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field(
                "model_client",
                &self.model_client.as_ref().map(|_| "<dyn GenerativeModel>"),
            )
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_chunk_chars", &self.max_chunk_chars)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("translate_delay_ms", &self.translate_delay_ms)
            .field("page_join", &self.page_join)
            .field("pages", &self.pages)
            .field("target_language", &self.target_language)
            .field("output_suffix", &self.output_suffix)
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier in effect for this run.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model_client(mut self, client: Arc<dyn GenerativeModel>) -> Self {
        self.config.model_client = Some(client);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn ocr_temperature(mut self, t: f32) -> Self {
        self.config.ocr_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn ocr_max_tokens(mut self, n: usize) -> Self {
        self.config.ocr_max_tokens = n;
        self
    }

    pub fn detect_max_tokens(mut self, n: usize) -> Self {
        self.config.detect_max_tokens = n;
        self
    }

    pub fn translate_temperature(mut self, t: f32) -> Self {
        self.config.translate_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn translate_max_tokens(mut self, n: usize) -> Self {
        self.config.translate_max_tokens = n;
        self
    }

    pub fn max_chunk_chars(mut self, n: usize) -> Self {
        self.config.max_chunk_chars = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn translate_delay_ms(mut self, ms: u64) -> Self {
        self.config.translate_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn page_join(mut self, join: PageJoin) -> Self {
        self.config.page_join = join;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn target_language(mut self, language: impl Into<String>) -> Self {
        self.config.target_language = language.into();
        self
    }

    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.output_suffix = suffix.into();
        self
    }

    pub fn ocr_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.ocr_prompt = Some(prompt.into());
        self
    }

    pub fn translation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.translation_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslateError> {
        let c = &self.config;
        if c.max_chunk_chars == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_chunk_chars must be ≥ 1".into(),
            ));
        }
        if c.ocr_max_tokens == 0 || c.translate_max_tokens == 0 || c.detect_max_tokens == 0 {
            return Err(TranslateError::InvalidConfig(
                "max output tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(TranslateError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.target_language.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "target language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the text of one page is attached to the text accumulated so far.
///
/// A page break in the PDF says nothing about whether the paragraph ends
/// there. The chunker splits on newlines, so the choice decides whether a
/// sentence running across pages can land in two different chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageJoin {
    /// Ask the model whether the page opens a new paragraph. (default)
    #[default]
    DetectParagraphs,
    /// Every page starts a new paragraph.
    NewParagraph,
    /// Every page continues the previous paragraph.
    Continue,
}

/// Specifies which pages of the PDF to translate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_run_schedule() {
        let c = TranslationConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.max_chunk_chars, 2000);
        assert_eq!(c.ocr_max_tokens, 2048);
        assert_eq!(c.translate_max_tokens, 5000);
        assert_eq!(c.detect_max_tokens, 16);
        assert_eq!(c.output_suffix, "_ja");
        assert_eq!(c.page_join, PageJoin::DetectParagraphs);
        assert_eq!(c.model_id(), DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps_dpi_and_temperature() {
        let c = TranslationConfig::builder()
            .dpi(1000)
            .translate_temperature(9.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 400);
        assert_eq!(c.translate_temperature, 2.0);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn builder_rejects_zero_chunk_size() {
        let err = TranslationConfig::builder()
            .max_chunk_chars(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_blank_language() {
        assert!(TranslationConfig::builder()
            .target_language("  ")
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = TranslationConfig::builder()
            .api_key("AIza-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("AIza-secret"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(4, 99).to_indices(5), vec![3, 4]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2]
        );
    }
}
