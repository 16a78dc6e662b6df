//! Native client for the Gemini `generateContent` REST endpoint.
//!
//! Gemini accepts image and text parts side by side in one user turn, which is
//! exactly the shape of an OCR request, so no chat-message translation layer
//! is needed: each [`Part`] maps to one wire part.

use super::{GenerateRequest, Generation, GenerativeModel, Part};
use crate::error::ModelError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a proxy or compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// First non-empty key among [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

fn build_request_body(request: &GenerateRequest) -> WireRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::Image { mime_type, data } => WirePart {
                inline_data: Some(WireInlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                }),
                ..Default::default()
            },
        })
        .collect();

    WireRequest {
        contents: vec![WireContent {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: WireGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

/// Pull the answer text out of a successful response body.
fn parse_response_body(body: &str) -> Result<Generation, ModelError> {
    let resp: WireResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
        ModelError::MalformedResponse("response has no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r != "STOP") {
            return Err(ModelError::Api {
                status: None,
                message: format!("empty response, finish reason {reason}"),
            });
        }
    }

    let usage = resp.usage_metadata.unwrap_or_default();
    Ok(Generation {
        text,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

fn classify_status(status: StatusCode, retry_after_secs: Option<u64>, body: String) -> ModelError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited { retry_after_secs },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Auth { detail: body },
        _ => ModelError::Api {
            status: Some(status.as_u16()),
            message: body,
        },
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, ModelError> {
        let body = build_request_body(request);
        debug!(
            "Gemini request to model={} ({} parts, max {} tokens)",
            self.model,
            request.parts.len(),
            request.max_output_tokens
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        parse_response_body(&text)
    }
}
