//! Pipeline stages for PDF-to-Word translation.
//!
//! Each submodule implements one transformation step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ ocr ──▶ assemble::join_pages
//! (path/URL) (pdfium)   (PNG)    (VLM)        │
//!                                              ▼
//!        assemble::build_docx ◀── translate ◀── chunk
//!              (docx-rs)            (LLM)     (paragraphs)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path, URL or bytes to a local file
//! 2. [`render`]: rasterise selected pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]: PNG-encode each `DynamicImage` for the request body
//! 4. [`ocr`]: extract each page's text and classify how it joins the previous
//!    page, cleaned by [`postprocess`]
//! 5. [`chunk`]: split the joined text at paragraph boundaries
//! 6. [`translate`]: translate chunks in order
//! 7. [`assemble`]: join pages, lay out paragraphs, write the `.docx`
//!
//! Every remote call goes through [`llm::generate_with_retry`].

pub mod assemble;
pub mod chunk;
pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod render;
pub mod translate;
