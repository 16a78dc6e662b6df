//! Remote translation of text chunks.
//!
//! Chunks are translated one at a time, in order, with a fixed pause between
//! consecutive calls to stay under per-minute request quotas. The answer is
//! kept verbatim; only the document assembler trims it, line by line.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::model::{GenerateRequest, GenerativeModel, Part};
use crate::pipeline::llm::{generate_with_retry, CallOutcome, RetryPolicy};
use crate::progress::schedule;
use crate::prompts::translation_prompt;
use tokio::time::{sleep, Duration};
use tracing::info;

/// Translate one chunk. `index` is 1-indexed and only used for logs and errors.
pub async fn translate_chunk(
    model: &dyn GenerativeModel,
    chunk: &str,
    index: usize,
    config: &TranslationConfig,
) -> Result<CallOutcome, TranslateError> {
    let instruction = config
        .translation_prompt
        .clone()
        .unwrap_or_else(|| translation_prompt(&config.target_language));
    let request = GenerateRequest::new(
        vec![Part::text(instruction), Part::text(chunk)],
        config.translate_temperature,
        config.translate_max_tokens,
    );
    let context = format!("translation of chunk {index}");
    generate_with_retry(model, &request, &RetryPolicy::from_config(config), &context).await
}

/// Translate every chunk in order, sleeping `translate_delay_ms` between calls.
///
/// Returns the translations (same order as `chunks`) and the call outcomes.
pub async fn translate_all(
    model: &dyn GenerativeModel,
    chunks: &[String],
    config: &TranslationConfig,
) -> Result<Vec<CallOutcome>, TranslateError> {
    let total = chunks.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        let index = i + 1;
        if i > 0 && config.translate_delay_ms > 0 {
            sleep(Duration::from_millis(config.translate_delay_ms)).await;
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_start(index, total);
        }
        info!("Translating chunk {}/{} ({} chars)", index, total, chunk.chars().count());

        let outcome = translate_chunk(model, chunk, index, config).await?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_complete(index, total, outcome.generation.text.len());
            cb.on_progress(schedule::translation(index, total));
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::Generation;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes each chunk back with a prefix and records call times.
    struct Echo {
        calls: Mutex<Vec<(tokio::time::Instant, GenerateRequest)>>,
    }

    #[async_trait]
    impl GenerativeModel for Echo {
        fn provider(&self) -> &str {
            "test"
        }
        fn model(&self) -> &str {
            "echo"
        }
        async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ModelError> {
            self.calls
                .lock()
                .unwrap()
                .push((tokio::time::Instant::now(), request.clone()));
            let chunk = request.texts().last().unwrap_or_default();
            Ok(Generation::text(format!("[ja] {chunk}")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn translates_in_order_with_pauses() {
        let model = Echo {
            calls: Mutex::new(Vec::new()),
        };
        let config = TranslationConfig::default();
        let chunks = vec!["first.".to_string(), "second.".to_string(), "third.".to_string()];

        let outcomes = translate_all(&model, &chunks, &config).await.unwrap();
        let texts: Vec<&str> = outcomes.iter().map(|o| o.generation.text.as_str()).collect();
        assert_eq!(texts, vec!["[ja] first.", "[ja] second.", "[ja] third."]);

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(1000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn request_layout_uses_instruction_then_chunk() {
        let model = Echo {
            calls: Mutex::new(Vec::new()),
        };
        let config = TranslationConfig::builder()
            .target_language("French")
            .build()
            .unwrap();
        translate_chunk(&model, "Hello.", 1, &config).await.unwrap();

        let calls = model.calls.lock().unwrap();
        let request = &calls[0].1;
        let texts: Vec<&str> = request.texts().collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("into French"));
        assert_eq!(texts[1], "Hello.");
        assert!(!request.has_image());
        assert!((request.temperature - 0.7).abs() < 1e-6);
        assert_eq!(request.max_output_tokens, 5000);
    }

    #[tokio::test]
    async fn no_chunks_no_calls() {
        let model = Echo {
            calls: Mutex::new(Vec::new()),
        };
        let outcomes = translate_all(&model, &[], &TranslationConfig::default())
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert!(model.calls.lock().unwrap().is_empty());
    }
}
