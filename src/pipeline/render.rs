//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! pdfium is a blocking C++ library with thread-local state, so all work runs
//! inside `tokio::task::spawn_blocking`.
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 units per inch) and
//! then capped at `max_rendered_pixels` on either edge, so a poster-sized
//! page cannot allocate an unbounded bitmap.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit libpdfium to load.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to libpdfium: `PDFIUM_LIB_PATH` first, then the system library.
fn bind_pdfium() -> Result<Pdfium, TranslateError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path)
            .map_err(|e| TranslateError::PdfiumBindingFailed(format!("{path}: {e:?}")))?,
        _ => Pdfium::bind_to_system_library()
            .map_err(|e| TranslateError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

fn open_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> TranslateError {
    let err_str = format!("{e:?}");
    if err_str.to_lowercase().contains("password") {
        if password.is_some() {
            TranslateError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            TranslateError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        TranslateError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Rasterise selected pages of a PDF.
///
/// # Returns
/// `(page_index_0based, DynamicImage)` pairs in the order of `page_indices`.
pub async fn render_pages(
    pdf_path: &Path,
    config: &TranslationConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, TranslateError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| TranslateError::Internal(format!("Render task panicked: {e}")))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, TranslateError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| open_error(pdf_path, password, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages, rendering at {} DPI", total_pages, dpi);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(page_indices.len());
    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = pages
            .get(idx as u16)
            .map_err(|e| TranslateError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            TranslateError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        results.push((idx, image));
    }

    Ok(results)
}

/// Read document metadata without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, TranslateError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| TranslateError::Internal(format!("Metadata task panicked: {e}")))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, TranslateError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| open_error(pdf_path, password, e))?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
