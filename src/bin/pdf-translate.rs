//! CLI binary for edgequake-pdf-translate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig`, writes the `.docx` and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_translate::{
    inspect, output_file_name, translate_pdf, write_document, PageJoin, PageSelection,
    ProgressCallback, Stage, TranslationConfig, TranslationProgressCallback, TranslationStats,
};
use edgequake_pdf_translate::pipeline::chunk::DEFAULT_MAX_CHUNK_CHARS;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One percentage bar for the whole run, labelled with the current stage,
/// plus a log line per page and per chunk.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_pages} pages…"))
        ));
    }

    fn on_stage(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn on_page_start(&self, page_num: usize, total: usize) {
        self.bar.set_message(format!("page {page_num}/{total}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page  {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
        ));
    }

    fn on_chunks_ready(&self, total_chunks: usize) {
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&format!("{total_chunks} chunks"))));
    }

    fn on_chunk_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("chunk {index}/{total}"));
    }

    fn on_chunk_complete(&self, index: usize, total: usize, translated_len: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{translated_len:>5} bytes")),
        ));
    }

    fn on_progress(&self, fraction: f32) {
        self.bar
            .set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
    }

    fn on_run_complete(&self, _stats: &TranslationStats) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate to Japanese, writing paper_ja.docx in the current directory
  pdf-translate paper.pdf

  # Explicit output, first ten pages only
  pdf-translate --pages 1-10 paper.pdf -o out/paper_ja.docx

  # Another language and suffix
  pdf-translate --target-language German --suffix _de paper.pdf

  # Every page starts a new paragraph (saves one call per page)
  pdf-translate --page-join new-paragraph slides.pdf

  # Use an edgequake-llm provider instead of Gemini
  pdf-translate --provider openai --model gpt-4.1-mini paper.pdf

  # Keep the extracted source text and a JSON record of the run
  pdf-translate --source-out paper.txt --json paper.pdf > run.json

  # Inspect PDF metadata (no API key needed)
  pdf-translate --inspect-only paper.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (GOOGLE_API_KEY also accepted)
  EDGEQUAKE_LLM_PROVIDER  Provider other than Gemini (openai, anthropic, ollama, …)
  EDGEQUAKE_MODEL         Model ID for that provider
  PDFIUM_LIB_PATH         Path to libpdfium, when it is not installed system-wide
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Translate PDF files into Word documents using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-translate",
    version,
    about = "Translate PDF files into Word documents using Vision LLMs",
    long_about = "Rasterise each page of a PDF, extract its text with a multimodal model, \
split the text at paragraph boundaries and translate it chunk by chunk into a .docx file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output .docx path. Default: <stem><suffix>.docx in the current directory.
    #[arg(short, long, env = "PDF_TRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider: gemini (default) or any edgequake-llm provider.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Model ID. Default: gemini-2.5-flash.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF_TRANSLATE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF_TRANSLATE_PAGES", default_value = "all")]
    pages: String,

    /// How each page joins the text before it.
    #[arg(long, env = "PDF_TRANSLATE_PAGE_JOIN", value_enum, default_value = "detect")]
    page_join: PageJoinArg,

    /// Maximum characters per translation chunk.
    #[arg(long, env = "PDF_TRANSLATE_CHUNK_CHARS", default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    chunk_chars: usize,

    /// Language to translate into.
    #[arg(long, env = "PDF_TRANSLATE_LANGUAGE", default_value = "Japanese")]
    target_language: String,

    /// Suffix appended to the input stem for the default output name.
    #[arg(long, env = "PDF_TRANSLATE_SUFFIX", default_value = "_ja")]
    suffix: String,

    /// Retries per call on rate limit or timeout.
    #[arg(long, env = "PDF_TRANSLATE_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Delay between retries, in milliseconds.
    #[arg(long, env = "PDF_TRANSLATE_RETRY_DELAY_MS", default_value_t = 5000)]
    retry_delay_ms: u64,

    /// Pause between consecutive translation calls, in milliseconds.
    #[arg(long, env = "PDF_TRANSLATE_DELAY_MS", default_value_t = 1000)]
    translate_delay_ms: u64,

    /// Pages OCR'd concurrently.
    #[arg(short, long, env = "PDF_TRANSLATE_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_TRANSLATE_PASSWORD")]
    password: Option<String>,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "PDF_TRANSLATE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_TRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Text file replacing the built-in OCR instruction.
    #[arg(long)]
    ocr_prompt: Option<PathBuf>,

    /// Text file replacing the built-in translation instruction.
    #[arg(long)]
    translation_prompt: Option<PathBuf>,

    /// Also write the extracted source text to this file.
    #[arg(long)]
    source_out: Option<PathBuf>,

    /// Print a JSON record of the run (TranslationOutput) on stdout.
    #[arg(long)]
    json: bool,

    /// Print PDF metadata only, no translation.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_TRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PageJoinArg {
    Detect,
    NewParagraph,
    Continue,
}

impl From<PageJoinArg> for PageJoin {
    fn from(v: PageJoinArg) -> Self {
        match v {
            PageJoinArg::Detect => PageJoin::DetectParagraphs,
            PageJoinArg::NewParagraph => PageJoin::NewParagraph,
            PageJoinArg::Continue => PageJoin::Continue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!("Output:       {}", output_file_name(&cli.input, &cli.suffix));
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output_file_name(&cli.input, &config.output_suffix)));

    // ── Run translation ──────────────────────────────────────────────────
    let output = translate_pdf(&cli.input, &config)
        .await
        .context("Translation failed")?;

    write_document(&output, &output_path)
        .await
        .context("Failed to save Word document")?;

    if let Some(ref path) = cli.source_out {
        tokio::fs::write(path, &output.source_text)
            .await
            .with_context(|| format!("Failed to write source text to {:?}", path))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} pages  {} chunks  {}ms  →  {}",
            green("✔"),
            stats.processed_pages,
            stats.chunks,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out  /  {} retries",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
            dim(&stats.retries.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .dpi(cli.dpi)
        .concurrency(cli.concurrency)
        .pages(parse_pages(&cli.pages)?)
        .page_join(cli.page_join.clone().into())
        .max_chunk_chars(cli.chunk_chars)
        .target_language(cli.target_language.clone())
        .output_suffix(cli.suffix.clone())
        .max_retries(cli.max_retries)
        .retry_delay_ms(cli.retry_delay_ms)
        .translate_delay_ms(cli.translate_delay_ms)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref path) = cli.ocr_prompt {
        builder = builder.ocr_prompt(read_prompt(path).await?);
    }
    if let Some(ref path) = cli.translation_prompt {
        builder = builder.translation_prompt(read_prompt(path).await?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_prompt(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt from {:?}", path))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_selections() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(parse_pages(" 7 ").unwrap(), PageSelection::Single(7)));
        assert!(matches!(parse_pages("3-5").unwrap(), PageSelection::Range(3, 5)));
        match parse_pages("1, 3,5").unwrap() {
            PageSelection::Set(v) => assert_eq!(v, vec![1, 3, 5]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-3").is_err());
        assert!(parse_pages("1,x").is_err());
    }

    #[test]
    fn cli_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["pdf-translate", "paper.pdf"]);
        assert_eq!(cli.dpi, 200);
        assert_eq!(cli.chunk_chars, 2000);
        assert_eq!(cli.suffix, "_ja");
        assert!(matches!(cli.page_join, PageJoinArg::Detect));
    }
}
