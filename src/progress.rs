//! Progress-callback trait and the fixed progress schedule.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events as the run moves through its stages.
//!
//! The overall fraction follows a fixed schedule rather than measured work:
//! extraction fills `0.0 → 0.5`, translation fills `0.5 → 0.9`, and writing
//! the document jumps to `1.0`. See [`schedule`].
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_translate::{TranslationConfig, TranslationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ChunkCounter(AtomicUsize);
//!
//! impl TranslationProgressCallback for ChunkCounter {
//!     fn on_chunk_complete(&self, index: usize, total: usize, _translated_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {index}/{total} translated");
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(ChunkCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::TranslationStats;
use std::fmt;
use std::sync::Arc;

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rasterise,
    Extract,
    Chunk,
    Translate,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Rasterise => "Converting PDF to images",
            Stage::Extract => "Extracting text and detecting paragraphs",
            Stage::Chunk => "Splitting into chunks",
            Stage::Translate => "Translating chunks",
            Stage::Assemble => "Generating Word file",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it works through a document.
///
/// All methods default to no-ops. With `concurrency > 1` the page events may
/// arrive from several tasks at once, so implementations must be `Send + Sync`.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once the page count is known, before rasterising.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when the run enters a new stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called just before the OCR request for a page (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's text has been extracted.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called once the full text has been split.
    fn on_chunks_ready(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before a chunk (1-indexed) is sent for translation.
    fn on_chunk_start(&self, index: usize, total_chunks: usize) {
        let _ = (index, total_chunks);
    }

    /// Called when a chunk has been translated.
    fn on_chunk_complete(&self, index: usize, total_chunks: usize, translated_len: usize) {
        let _ = (index, total_chunks, translated_len);
    }

    /// Overall completion in `0.0..=1.0`, per [`schedule`].
    fn on_progress(&self, fraction: f32) {
        let _ = fraction;
    }

    /// Called once after the document has been assembled.
    fn on_run_complete(&self, stats: &TranslationStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

/// The fixed fraction schedule reported through `on_progress`.
pub mod schedule {
    /// Fraction reached when every page has been extracted.
    pub const EXTRACT_END: f32 = 0.5;
    /// Fraction reached when every chunk has been translated.
    pub const TRANSLATE_END: f32 = 0.9;
    /// Fraction reported once the document is written.
    pub const DONE: f32 = 1.0;

    /// Progress after `done` of `total` pages have been extracted.
    pub fn extraction(done: usize, total: usize) -> f32 {
        if total == 0 {
            return EXTRACT_END;
        }
        EXTRACT_END * (done.min(total) as f32 / total as f32)
    }

    /// Progress after `done` of `total` chunks have been translated.
    pub fn translation(done: usize, total: usize) -> f32 {
        if total == 0 {
            return TRANSLATE_END;
        }
        EXTRACT_END + (TRANSLATE_END - EXTRACT_END) * (done.min(total) as f32 / total as f32)
    }
}
