//! Error types for the edgequake-pdf-translate library.
//!
//! Two error types reflect two layers of failure:
//!
//! * [`TranslateError`]: **fatal**, the run cannot continue (bad input file,
//!   missing credential, corrupt PDF, a model call that failed for good).
//!   Returned as `Err(TranslateError)` from every `translate*` entry point.
//!
//! * [`ModelError`]: a single remote generative-model call failed. The retry
//!   loop in [`crate::pipeline::llm`] inspects it to decide whether another
//!   attempt is worthwhile, and wraps it into a [`TranslateError`] once it
//!   gives up.
//!
//! A run never yields a partial document: the first fatal error ends it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read (a directory, an I/O fault).
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input string is empty or otherwise unusable.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF conversion error for '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// No API key could be found for the selected provider.
    #[error("No API key for provider '{provider}'.\nPass --api-key or set {env_var}.")]
    MissingCredential { provider: String, env_var: String },

    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Rate-limit retries were exhausted for one call.
    #[error("Rate limit still exceeded for {context} after {attempts} attempts")]
    RateLimitExceeded { context: String, attempts: u32 },

    /// Per-call timeout retries were exhausted for one call.
    #[error("{context} timed out after {attempts} attempts of {secs}s each")]
    Timeout {
        context: String,
        attempts: u32,
        secs: u64,
    },

    /// A model call failed with a non-retryable error.
    #[error("{context} failed: {source}")]
    Model {
        context: String,
        #[source]
        source: ModelError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The docx package could not be produced.
    #[error("Failed to build Word document: {0}")]
    DocumentBuildFailed(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single remote generative-model call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// HTTP 429 / quota exhausted. `retry_after_secs` is the server hint, if any.
    #[error("rate limited (429){}", .retry_after_secs.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP 401/403.
    #[error("authentication rejected: {detail}")]
    Auth { detail: String },

    /// Any other error status or provider-reported failure.
    #[error("API error{}: {message}", .status.map(|s| format!(" {s}")).unwrap_or_default())]
    Api { status: Option<u16>, message: String },

    /// Connection-level failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not finish in time. `secs` is 0 when the provider timed
    /// out on its own clock.
    #[error("no response within {secs}s")]
    Timeout { secs: u64 },

    /// The response arrived but had no usable text field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Whether another attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. } | ModelError::Timeout { .. })
    }

    /// Classify a provider error that only exposes a message.
    ///
    /// Used for raw upstream error bodies, where the HTTP status can only be
    /// recovered from the text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429")
            || lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("resource_exhausted")
        {
            ModelError::RateLimited {
                retry_after_secs: None,
            }
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
        {
            ModelError::Auth { detail: message }
        } else {
            ModelError::Api {
                status: None,
                message,
            }
        }
    }
}
