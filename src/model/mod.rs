//! The remote generative-model seam.
//!
//! Every remote call in the pipeline (OCR, paragraph detection, translation)
//! is one [`GenerateRequest`]: an ordered list of content [`Part`]s plus
//! sampling parameters. The model identifier belongs to the client, not the
//! request. Two clients ship with the crate:
//!
//! * [`gemini::GeminiClient`]: Google's `generateContent` REST endpoint.
//! * [`edgequake::EdgequakeModel`]: any `edgequake_llm::LLMProvider`
//!   (OpenAI, Anthropic, Ollama, Azure, …).
//!
//! Tests and embedders can supply their own implementation through
//! [`crate::config::TranslationConfig::model_client`].

pub mod edgequake;
pub mod gemini;

use crate::error::ModelError;
use async_trait::async_trait;

pub use edgequake::EdgequakeModel;
pub use gemini::GeminiClient;

/// One piece of request content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Raw image bytes; clients base64-encode as their wire format requires.
    Image { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text(s.into())
    }

    pub fn png(data: Vec<u8>) -> Self {
        Part::Image {
            mime_type: "image/png".to_string(),
            data,
        }
    }

    /// The text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(s) => Some(s),
            Part::Image { .. } => None,
        }
    }
}

/// A single generative-content request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl GenerateRequest {
    pub fn new(parts: Vec<Part>, temperature: f32, max_output_tokens: usize) -> Self {
        Self {
            parts,
            temperature,
            max_output_tokens,
        }
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Image { .. }))
    }

    /// All text parts, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(Part::as_text)
    }
}

/// The model's answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Response text, unmodified.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Generation {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            text: s.into(),
            ..Default::default()
        }
    }
}

/// A hosted model able to answer [`GenerateRequest`]s.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Provider name, for logs.
    fn provider(&self) -> &str;

    /// Model identifier, for logs.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ModelError>;
}
