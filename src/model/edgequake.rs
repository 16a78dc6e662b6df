//! Adapter exposing any edgequake-llm provider as a [`GenerativeModel`].
//!
//! Chat-style providers have no notion of free-standing content parts, so a
//! request becomes a single user turn: its text parts joined by blank lines,
//! with any image parts attached as base64 PNGs at `detail: "high"`.

use super::{GenerateRequest, Generation, GenerativeModel, Part};
use crate::error::{ModelError, TranslateError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{
    ChatMessage, CompletionOptions, ImageData, LLMProvider, LlmError, ProviderFactory,
};
use std::sync::Arc;
use tracing::debug;

pub struct EdgequakeModel {
    provider: Arc<dyn LLMProvider>,
    provider_name: String,
    model: String,
}

impl EdgequakeModel {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        provider_name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            provider_name: provider_name.into(),
            model: model.into(),
        }
    }

    /// Build a named provider via [`ProviderFactory::create_llm_provider`],
    /// which reads the provider's own API-key variable (`OPENAI_API_KEY`, …).
    pub fn from_factory(provider_name: &str, model: &str) -> Result<Self, TranslateError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            TranslateError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, provider_name, model))
    }

    /// Honour `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set.
    pub fn from_env() -> Option<Result<Self, TranslateError>> {
        match (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            (Ok(prov), Ok(model)) if !prov.is_empty() && !model.is_empty() => {
                Some(Self::from_factory(&prov, &model))
            }
            _ => None,
        }
    }
}

/// Convert a request into the single chat turn sent to the provider.
fn build_messages(request: &GenerateRequest) -> Vec<ChatMessage> {
    let text = request.texts().collect::<Vec<_>>().join("\n\n");
    let images: Vec<ImageData> = request
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::Image { mime_type, data } => {
                Some(ImageData::new(STANDARD.encode(data), mime_type.as_str()).with_detail("high"))
            }
            Part::Text(_) => None,
        })
        .collect();

    if images.is_empty() {
        vec![ChatMessage::user(&text)]
    } else {
        vec![ChatMessage::user_with_images(&text, images)]
    }
}

/// Map a provider error onto the retry classes.
///
/// Typed variants are mapped directly. Only the catch-all variants that carry
/// a raw upstream message go through [`ModelError::from_message`].
fn classify(err: LlmError) -> ModelError {
    match err {
        LlmError::RateLimited(_) => ModelError::RateLimited {
            retry_after_secs: None,
        },
        LlmError::AuthError(detail) => ModelError::Auth { detail },
        LlmError::NetworkError(msg) => ModelError::Transport(msg),
        LlmError::Timeout => ModelError::Timeout { secs: 0 },
        LlmError::SerializationError(e) => ModelError::MalformedResponse(e.to_string()),
        LlmError::ApiError(msg) | LlmError::ProviderError(msg) => ModelError::from_message(msg),
        other => ModelError::Api {
            status: None,
            message: other.to_string(),
        },
    }
}

fn build_options(request: &GenerateRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_output_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl GenerativeModel for EdgequakeModel {
    fn provider(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ModelError> {
        let messages = build_messages(request);
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(classify)?;

        debug!(
            "{}:{} answered: {} input tokens, {} output tokens",
            self.provider_name, self.model, response.prompt_tokens, response.completion_tokens
        );

        Ok(Generation {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_copies_sampling_parameters() {
        let request = GenerateRequest::new(vec![Part::text("hi")], 0.7, 5000);
        let opts = build_options(&request);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(5000));
    }

    #[test]
    fn text_only_request_is_one_user_turn() {
        let request = GenerateRequest::new(
            vec![Part::text("Translate this."), Part::text("Hello.")],
            0.7,
            100,
        );
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Translate this.\n\nHello.");
    }

    #[test]
    fn image_request_attaches_images() {
        let request = GenerateRequest::new(
            vec![Part::png(vec![1, 2, 3]), Part::text("Extract.")],
            0.0,
            100,
        );
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Extract.");
    }

    #[test]
    fn typed_provider_errors_keep_their_class() {
        assert_eq!(
            classify(LlmError::RateLimited("slow down".into())),
            ModelError::RateLimited {
                retry_after_secs: None
            }
        );
        assert_eq!(
            classify(LlmError::AuthError("bad key".into())),
            ModelError::Auth {
                detail: "bad key".into()
            }
        );
        assert_eq!(
            classify(LlmError::NetworkError("connection reset".into())),
            ModelError::Transport("connection reset".into())
        );
        assert!(classify(LlmError::Timeout).is_retryable());

        let bad_json = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(
            classify(LlmError::SerializationError(bad_json)),
            ModelError::MalformedResponse(_)
        ));
    }

    #[test]
    fn request_errors_are_not_retried_even_when_they_mention_429() {
        let errors = vec![
            LlmError::TokenLimitExceeded {
                max: 4096,
                got: 5429,
            },
            LlmError::InvalidRequest("max_tokens 429 too small".into()),
            LlmError::ModelNotFound("gemini-429".into()),
            LlmError::ConfigError("missing endpoint".into()),
            LlmError::NotSupported("images".into()),
            LlmError::Unknown("401 in upstream body".into()),
        ];
        for err in errors {
            let classified = classify(err);
            assert!(
                matches!(classified, ModelError::Api { status: None, .. }),
                "got {classified:?}"
            );
            assert!(!classified.is_retryable());
        }
    }

    #[test]
    fn raw_upstream_messages_are_sniffed() {
        assert!(matches!(
            classify(LlmError::ApiError("HTTP 429 Too Many Requests".into())),
            ModelError::RateLimited { .. }
        ));
        assert!(matches!(
            classify(LlmError::ProviderError("401 Unauthorized".into())),
            ModelError::Auth { .. }
        ));
        assert!(matches!(
            classify(LlmError::ApiError("model overloaded".into())),
            ModelError::Api { .. }
        ));
    }
}
