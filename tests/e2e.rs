//! End-to-end integration tests for edgequake-pdf-translate.
//!
//! These tests use real PDF files in `./test_cases/`, need a pdfium library
//! and make live Gemini API calls. They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use edgequake_pdf_translate::{
    inspect, output_file_name, translate_pdf, translate_to_file, PageJoin, PageSelection,
    TranslateError, TranslationConfig,
};
use std::io::Read;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Paragraph texts of a `.docx`, read back from `word/document.xml`.
fn docx_text(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(docx)).expect("docx is a zip");
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .expect("document part")
        .read_to_string(&mut xml)
        .expect("utf-8 xml");
    xml
}

fn has_japanese(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '\u{3040}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}'))
}

// ── Inspect tests (no LLM) ───────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_arxiv_paper() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let meta = inspect(path.to_str().unwrap())
        .await
        .expect("inspect() should succeed");

    assert_eq!(meta.page_count, 15, "Attention paper should have 15 pages");
    assert!(!meta.pdf_version.is_empty());
    println!("Metadata: {:?}", meta);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }
    let result = inspect("/definitely/not/a/real/file.pdf").await;
    assert!(matches!(result, Err(TranslateError::FileNotFound { .. })));
}

// ── Unit checks (no LLM, always run) ─────────────────────────────────────────

#[test]
fn test_page_selection_range_clipping() {
    // Range 3-10 on a 4-page doc → pages 3 and 4 (indices 2, 3)
    assert_eq!(PageSelection::Range(3, 10).to_indices(4), vec![2, 3]);
}

#[test]
fn test_default_output_name() {
    assert_eq!(
        output_file_name("test_cases/attention_is_all_you_need.pdf", "_ja"),
        "attention_is_all_you_need_ja.docx"
    );
}

#[tokio::test]
async fn test_missing_key_fails_before_rendering() {
    if std::env::var("GEMINI_API_KEY").is_ok()
        || std::env::var("GOOGLE_API_KEY").is_ok()
        || std::env::var("EDGEQUAKE_LLM_PROVIDER").is_ok()
    {
        println!("SKIP: a credential is present in the environment");
        return;
    }
    let mut pdf = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut pdf, b"%PDF-1.4\n%%EOF\n").unwrap();

    let err = translate_pdf(pdf.path().to_str().unwrap(), &TranslationConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, TranslateError::MissingCredential { .. }),
        "got {err:?}"
    );
}

// ── Translation tests (need pdfium + Gemini) ─────────────────────────────────

#[tokio::test]
async fn test_translate_arxiv_page1() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = TranslationConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let out = translate_pdf(path.to_str().unwrap(), &config)
        .await
        .expect("translation should succeed");

    assert_eq!(out.stats.processed_pages, 1);
    assert!(out.source_text.contains("Attention"));
    assert!(!out.chunks.is_empty());
    assert_eq!(out.translations.len(), out.chunks.len());
    assert!(out.chunks.iter().all(|c| !c.trim().is_empty()));
    assert!(has_japanese(&docx_text(&out.document)));

    println!(
        "{} chunks, {} paragraphs, {} tokens in / {} out",
        out.stats.chunks,
        out.paragraphs.len(),
        out.stats.total_input_tokens,
        out.stats.total_output_tokens
    );
}

#[tokio::test]
async fn test_translate_two_pages_to_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("nested").join("attention_ja.docx");

    let config = TranslationConfig::builder()
        .pages(PageSelection::Range(1, 2))
        .build()
        .expect("valid config");

    let stats = translate_to_file(path.to_str().unwrap(), &out_path, &config)
        .await
        .expect("translation should succeed");

    assert_eq!(stats.processed_pages, 2);
    let bytes = std::fs::read(&out_path).expect("docx written");
    assert!(has_japanese(&docx_text(&bytes)));
    assert!(!out_path.with_extension("docx.tmp").exists());
}

#[tokio::test]
async fn test_translate_german_without_detection() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = TranslationConfig::builder()
        .pages(PageSelection::Single(2))
        .page_join(PageJoin::Continue)
        .target_language("German")
        .build()
        .expect("valid config");

    let out = translate_pdf(path.to_str().unwrap(), &config)
        .await
        .expect("translation should succeed");

    assert!(!out.pages[0].starts_paragraph);
    assert!(!has_japanese(&out.translations.join("\n")));
    let json = serde_json::to_string(&out).expect("output is serialisable");
    assert!(json.contains("\"translations\""));
}
