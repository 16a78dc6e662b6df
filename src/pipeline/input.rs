//! Input resolution: turn a path, URL, or byte buffer into a local PDF file.
//!
//! pdfium opens documents from the file system, so every input ends up as a
//! path. URLs and in-memory bytes are written into a [`TempDir`] that lives
//! as long as the [`ResolvedInput`]. The `%PDF` magic is checked up front so
//! a wrong upload fails before any rendering or model call.

use crate::error::TranslateError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on local disk, plus the name the user knows it by.
#[derive(Debug)]
pub struct ResolvedInput {
    path: PathBuf,
    source_name: String,
    _temp_dir: Option<TempDir>,
}

impl ResolvedInput {
    /// Path pdfium should open.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the original input (e.g. `paper.pdf`), used to name the output.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TranslateError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

/// Stage an in-memory PDF as a temp file named `source_name`.
pub async fn resolve_bytes(bytes: &[u8], source_name: &str) -> Result<ResolvedInput, TranslateError> {
    let name = sanitize_file_name(source_name);
    check_magic(bytes, Path::new(&name))?;
    stage_in_temp_dir(bytes, name).await
}

async fn resolve_local(path_str: &str) -> Result<ResolvedInput, TranslateError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) => {
            return Err(match e.kind() {
                std::io::ErrorKind::NotFound => TranslateError::FileNotFound { path },
                std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied { path },
                _ => TranslateError::InputReadFailed { path, source: e },
            })
        }
    };
    check_magic(&bytes, &path)?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput {
        path,
        source_name,
        _temp_dir: None,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TranslateError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let download_err = |e: reqwest::Error| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            TranslateError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(download_err)?;
    if !response.status().is_success() {
        return Err(TranslateError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(download_err)?;
    let name = file_name_from_url(url);
    check_magic(&bytes, Path::new(&name))?;

    let resolved = stage_in_temp_dir(&bytes, name).await?;
    info!("Downloaded {} bytes to: {}", bytes.len(), resolved.path.display());
    Ok(resolved)
}

async fn stage_in_temp_dir(bytes: &[u8], name: String) -> Result<ResolvedInput, TranslateError> {
    let temp_dir = TempDir::new().map_err(|e| TranslateError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(&name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| TranslateError::Internal(format!("Failed to write temp file: {e}")))?;
    Ok(ResolvedInput {
        path,
        source_name: name,
        _temp_dir: Some(temp_dir),
    })
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), TranslateError> {
    if bytes.len() < 4 || &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(TranslateError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last path segment of the URL when it looks like a file name.
pub fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(|last| sanitize_file_name(&last))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

/// Strip directory components so a caller-supplied name cannot escape the temp dir.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "document.pdf".to_string())
}
