//! Full-run entry points: PDF in, translated Word document out.
//!
//! A run is strictly staged. All pages are rasterised, then OCR'd (and
//! classified), then the joined text is chunked, then every chunk is
//! translated in order, and only then is the document built. The first fatal
//! error ends the run; no partial document is ever returned.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::model::gemini::{api_key_from_env, API_KEY_ENV_VARS};
use crate::model::{EdgequakeModel, GeminiClient, GenerativeModel};
use crate::output::{DocumentMetadata, PageText, TranslationOutput, TranslationStats};
use crate::pipeline::{assemble, chunk, encode, input, ocr, render, translate};
use crate::progress::{schedule, Stage};
use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Translate a PDF file or URL into a Word document.
///
/// This is the primary entry point for the library. The model client is
/// resolved before any page is rendered, so a missing credential fails fast.
///
/// # Errors
/// Any [`TranslateError`]; there is no partial result.
pub async fn translate_pdf(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let input_str = input_str.as_ref();
    info!("Starting translation: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(&resolved, config).await
}

/// Translate PDF bytes held in memory.
///
/// `bytes` are staged in a managed temporary directory that is removed when
/// the call returns.
pub async fn translate_bytes(
    bytes: &[u8],
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let resolved = input::resolve_bytes(bytes, "document.pdf").await?;
    run(&resolved, config).await
}

/// Translate a PDF and write the `.docx` to `output_path`.
pub async fn translate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationStats, TranslateError> {
    let output = translate_pdf(input_str, config).await?;
    write_document(&output, output_path).await?;
    Ok(output.stats)
}

/// Write the document of a finished run to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_document(
    output: &TranslationOutput,
    path: impl AsRef<Path>,
) -> Result<(), TranslateError> {
    let path = path.as_ref();
    let write_err = |e| TranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &output.document)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Saved {} ({} bytes)", path.display(), output.document.len());
    Ok(())
}

/// Synchronous wrapper around [`translate_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_sync(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(translate_pdf(input_str, config))
}

/// Extract PDF metadata without rendering or translating.
///
/// Does not require a model or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, TranslateError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    render::extract_metadata(resolved.path(), None).await
}

/// Default output file name for a source path or URL: `{stem}{suffix}.docx`.
///
/// Only a trailing `.pdf` (any case) is dropped, so dotted names such as
/// arXiv identifiers keep every segment.
///
/// ```rust
/// use edgequake_pdf_translate::output_file_name;
///
/// assert_eq!(output_file_name("papers/ethics.pdf", "_ja"), "ethics_ja.docx");
/// assert_eq!(output_file_name("https://arxiv.org/pdf/1706.03762", "_ja"), "1706.03762_ja.docx");
/// ```
pub fn output_file_name(source: &str, suffix: &str) -> String {
    let name = if input::is_url(source) {
        input::file_name_from_url(source)
    } else {
        source.to_string()
    };
    let file_name = Path::new(&name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.len().checked_sub(4) {
        Some(cut)
            if file_name.is_char_boundary(cut)
                && file_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &file_name[..cut]
        }
        _ => file_name.as_str(),
    };
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{stem}{suffix}.docx")
}

/// Run everything after rasterisation on already-rendered pages.
///
/// `pages` are `(page_index_0based, image)` pairs in page order, as returned
/// by [`render::render_pages`]. Useful for callers with their own rasteriser.
pub async fn translate_page_images(
    model: &dyn GenerativeModel,
    pages: &[(usize, DynamicImage)],
    config: &TranslationConfig,
    metadata: DocumentMetadata,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.as_ref();
    let total = pages.len();

    // ── Extraction ───────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage(Stage::Extract);
    }
    let encoded = pages
        .iter()
        .map(|(idx, img)| {
            encode::encode_page(idx + 1, img).map_err(|e| TranslateError::RasterisationFailed {
                page: idx + 1,
                detail: format!("Image encoding failed: {}", e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let extract_start = Instant::now();
    let done = AtomicUsize::new(0);
    let page_texts: Vec<PageText> = stream::iter(encoded.iter().map(|page| {
        let done = &done;
        async move {
            if let Some(cb) = cb {
                cb.on_page_start(page.page_num, total);
            }
            let text = ocr::extract_page(model, page, config).await?;
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(cb) = cb {
                cb.on_page_complete(page.page_num, total, text.text.len());
                cb.on_progress(schedule::extraction(finished, total));
            }
            Ok::<_, TranslateError>(text)
        }
    }))
    .buffered(config.concurrency.max(1))
    .try_collect()
    .await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let source_text = assemble::join_pages(&page_texts);
    info!(
        "Extracted {} chars from {} pages in {}ms",
        source_text.chars().count(),
        page_texts.len(),
        extract_duration_ms
    );
    if let Some(cb) = cb {
        cb.on_progress(schedule::EXTRACT_END);
    }

    // ── Chunking ─────────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage(Stage::Chunk);
    }
    let chunks = chunk::split_into_chunks(&source_text, config.max_chunk_chars);
    if chunks.is_empty() {
        warn!("No text was extracted; the document will be empty");
    }
    debug!("Split into {} chunks", chunks.len());
    if let Some(cb) = cb {
        cb.on_chunks_ready(chunks.len());
    }

    // ── Translation ──────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage(Stage::Translate);
    }
    let translate_start = Instant::now();
    let outcomes = translate::translate_all(model, &chunks, config).await?;
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;
    if let Some(cb) = cb {
        cb.on_progress(schedule::TRANSLATE_END);
    }

    // ── Assembly ─────────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage(Stage::Assemble);
    }
    let translations: Vec<String> = outcomes
        .iter()
        .map(|o| o.generation.text.clone())
        .collect();
    let paragraphs = assemble::document_paragraphs(&translations);
    let document = assemble::build_docx(&paragraphs)?;

    let stats = TranslationStats {
        total_pages: metadata.page_count,
        processed_pages: page_texts.len(),
        chunks: chunks.len(),
        source_chars: source_text.chars().count(),
        translated_chars: translations.iter().map(|t| t.chars().count()).sum(),
        total_input_tokens: page_texts.iter().map(|p| p.input_tokens as u64).sum::<u64>()
            + outcomes
                .iter()
                .map(|o| o.generation.input_tokens as u64)
                .sum::<u64>(),
        total_output_tokens: page_texts.iter().map(|p| p.output_tokens as u64).sum::<u64>()
            + outcomes
                .iter()
                .map(|o| o.generation.output_tokens as u64)
                .sum::<u64>(),
        retries: page_texts.iter().map(|p| p.retries).sum::<u32>()
            + outcomes.iter().map(|o| o.retries).sum::<u32>(),
        render_duration_ms: 0,
        extract_duration_ms,
        translate_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    if let Some(cb) = cb {
        cb.on_progress(schedule::DONE);
    }

    Ok(TranslationOutput {
        source_text,
        pages: page_texts,
        chunks,
        translations,
        paragraphs,
        document,
        metadata,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    resolved: &input::ResolvedInput,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();
    let pdf_path = resolved.path();

    let model = resolve_model(config)?;
    info!("Using {}:{}", model.provider(), model.model());

    let metadata = render::extract_metadata(pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("{} has {} pages", resolved.source_name(), total_pages);

    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(TranslateError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for translation", page_indices.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(page_indices.len());
        cb.on_stage(Stage::Rasterise);
    }

    let render_start = Instant::now();
    let rendered = render::render_pages(pdf_path, config, &page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    let mut output = translate_page_images(model.as_ref(), &rendered, config, metadata).await?;
    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Translation complete: {} pages, {} chunks, {} paragraphs, {}ms total",
        output.stats.processed_pages,
        output.stats.chunks,
        output.paragraphs.len(),
        output.stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&output.stats);
    }
    Ok(output)
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.model_client`), used as-is.
/// 2. **Named edgequake-llm provider** (`config.provider_name` other than
///    `"gemini"`), built by `ProviderFactory`, which reads that provider's
///    own API-key variable. A model must be named explicitly.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    honoured only when no provider was named.
/// 4. **Gemini**, with `config.api_key` or the first of `GEMINI_API_KEY` /
///    `GOOGLE_API_KEY`.
fn resolve_model(config: &TranslationConfig) -> Result<Arc<dyn GenerativeModel>, TranslateError> {
    if let Some(ref client) = config.model_client {
        return Ok(Arc::clone(client));
    }

    match config.provider_name.as_deref() {
        Some(name) if !name.eq_ignore_ascii_case("gemini") => {
            let model = config.model.as_deref().ok_or_else(|| {
                TranslateError::InvalidConfig(format!(
                    "a model must be named when using provider '{name}'"
                ))
            })?;
            return Ok(Arc::new(EdgequakeModel::from_factory(name, model)?));
        }
        Some(_) => {}
        None => {
            if let Some(from_env) = EdgequakeModel::from_env() {
                return Ok(Arc::new(from_env?));
            }
        }
    }

    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(api_key_from_env)
        .ok_or_else(|| TranslateError::MissingCredential {
            provider: "gemini".to_string(),
            env_var: API_KEY_ENV_VARS[0].to_string(),
        })?;
    Ok(Arc::new(GeminiClient::new(api_key, config.model_id())))
}
