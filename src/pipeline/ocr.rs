//! Remote OCR and paragraph-start classification for one page.
//!
//! Both calls send the same page PNG. OCR pairs it with the extraction
//! instruction and keeps the (cleaned) answer. The classifier pairs it with
//! a YES/NO question and decides how the page's text is glued to the text of
//! the page before it.

use crate::config::{PageJoin, TranslationConfig};
use crate::error::TranslateError;
use crate::model::{GenerateRequest, GenerativeModel, Part};
use crate::output::PageText;
use crate::pipeline::encode::EncodedPage;
use crate::pipeline::llm::{generate_with_retry, RetryPolicy};
use crate::pipeline::postprocess::clean_text;
use crate::prompts::{OCR_PROMPT, PARAGRAPH_DETECT_PROMPT};
use std::time::Instant;
use tracing::{debug, warn};

/// Extract the text of `page`, and classify its start when configured to.
pub async fn extract_page(
    model: &dyn GenerativeModel,
    page: &EncodedPage,
    config: &TranslationConfig,
) -> Result<PageText, TranslateError> {
    let start = Instant::now();
    let policy = RetryPolicy::from_config(config);

    let prompt = config.ocr_prompt.as_deref().unwrap_or(OCR_PROMPT);
    let request = GenerateRequest::new(
        vec![Part::png(page.png.clone()), Part::text(prompt)],
        config.ocr_temperature,
        config.ocr_max_tokens,
    );
    let context = format!("OCR of page {}", page.page_num);
    let ocr = generate_with_retry(model, &request, &policy, &context).await?;
    let text = clean_text(&ocr.generation.text);
    if text.is_empty() {
        warn!("Page {}: OCR returned no text", page.page_num);
    }

    let detection = match config.page_join {
        PageJoin::NewParagraph => Detection::fixed(true),
        PageJoin::Continue => Detection::fixed(false),
        PageJoin::DetectParagraphs => detect_paragraph_start(model, page, config, &policy).await,
    };
    let starts_paragraph = detection.starts_paragraph;

    debug!(
        "Page {}: {} chars, new paragraph: {}",
        page.page_num,
        text.chars().count(),
        starts_paragraph
    );

    Ok(PageText {
        page_num: page.page_num,
        text,
        starts_paragraph,
        input_tokens: ocr.generation.input_tokens + detection.input_tokens,
        output_tokens: ocr.generation.output_tokens + detection.output_tokens,
        retries: ocr.retries + detection.retries,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Outcome of the paragraph-start question for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detection {
    pub starts_paragraph: bool,
    pub retries: u32,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Detection {
    fn fixed(starts_paragraph: bool) -> Self {
        Self {
            starts_paragraph,
            ..Default::default()
        }
    }
}

/// Ask whether `page` opens a new paragraph.
///
/// Fails open: any error is logged and treated as "new paragraph".
pub async fn detect_paragraph_start(
    model: &dyn GenerativeModel,
    page: &EncodedPage,
    config: &TranslationConfig,
    policy: &RetryPolicy,
) -> Detection {
    let request = GenerateRequest::new(
        vec![Part::png(page.png.clone()), Part::text(PARAGRAPH_DETECT_PROMPT)],
        0.0,
        config.detect_max_tokens,
    );
    let context = format!("paragraph detection for page {}", page.page_num);
    match generate_with_retry(model, &request, policy, &context).await {
        Ok(outcome) => Detection {
            starts_paragraph: parse_paragraph_answer(&outcome.generation.text),
            retries: outcome.retries,
            input_tokens: outcome.generation.input_tokens,
            output_tokens: outcome.generation.output_tokens,
        },
        Err(e) => {
            warn!("{e}; assuming page {} starts a paragraph", page.page_num);
            let retries = match e {
                TranslateError::RateLimitExceeded { .. } | TranslateError::Timeout { .. } => {
                    policy.max_retries
                }
                _ => 0,
            };
            Detection {
                starts_paragraph: true,
                retries,
                ..Default::default()
            }
        }
    }
}

/// `true` iff the answer is exactly `YES`, ignoring case and surrounding whitespace.
pub fn parse_paragraph_answer(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("YES")
}
