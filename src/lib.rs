//! # edgequake-pdf-translate
//!
//! Translate PDF documents into Word files using Vision Language Models.
//!
//! Scanned papers and books carry no usable text layer, and the text layer of
//! born-digital PDFs breaks on columns, hyphenation and ligatures. This crate
//! rasterises each page, lets a multimodal model read it, stitches the pages
//! back into running text, and translates that text chunk by chunk.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file, URL or in-memory bytes
//!  ├─ 2. Render     rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Extract    per-page OCR + "does this page open a paragraph?"
//!  ├─ 4. Chunk      split at paragraph boundaries, ≤ 2000 chars per chunk
//!  ├─ 5. Translate  one call per chunk, in order, paced
//!  └─ 6. Assemble   one Word paragraph per non-empty translated line
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_translate::{output_file_name, translate_to_file, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY (or GOOGLE_API_KEY)
//!     let config = TranslationConfig::default();
//!     let out = output_file_name("paper.pdf", &config.output_suffix);
//!     let stats = translate_to_file("paper.pdf", &out, &config).await?;
//!     eprintln!("{} chunks, {} tokens in", stats.chunks, stats.total_input_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-translate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-translate = { version = "0.1", default-features = false }
//! ```
//!
//! ## Models
//!
//! Gemini is called natively through its `generateContent` endpoint. Any other
//! provider supported by `edgequake-llm` (OpenAI, Anthropic, Ollama, …) can be
//! selected with [`TranslationConfig::provider_name`], and tests or embedders
//! can plug in their own [`GenerativeModel`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageJoin, PageSelection, TranslationConfig, TranslationConfigBuilder};
pub use convert::{
    inspect, output_file_name, translate_bytes, translate_page_images, translate_pdf,
    translate_sync, translate_to_file, write_document,
};
pub use error::{ModelError, TranslateError};
pub use model::{GenerateRequest, Generation, GenerativeModel, Part};
pub use output::{DocumentMetadata, PageText, TranslationOutput, TranslationStats};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, TranslationProgressCallback};
