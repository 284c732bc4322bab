//! Built-in client for Gemini's `generateContent` REST endpoint.
//!
//! The request carries one `user` turn with three parts in a fixed order:
//! the job description, the first résumé page as `inlineData`, then the
//! prompt. The reply's candidate text parts are concatenated and returned
//! exactly as received.
//!
//! The API key comes from [`AnalyzerConfig::api_key`] and is sent in the
//! `x-goog-api-key` header. A missing key is reported when a call is made,
//! not when the client is built.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use crate::pipeline::llm::{ModelClient, ModelReply, ModelRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const PROVIDER: &str = "gemini";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub(crate) fn build_request<'a>(
    request: &ModelRequest<'a>,
    config: &GenerationSettings,
) -> GenerateContentRequest<'a> {
    let generation_config = if config.temperature.is_some() || config.max_tokens.is_some() {
        Some(GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text {
                    text: request.job_description,
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: &request.image.mime_type,
                        data: &request.image.data,
                    },
                },
                Part::Text {
                    text: request.prompt,
                },
            ],
        }],
        generation_config,
    }
}

/// Pull the reply text out of a decoded response.
pub(crate) fn reply_from_response(response: GenerateContentResponse) -> Result<ModelReply, AtsError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(AtsError::EmptyResponse {
            provider: PROVIDER.into(),
            reason: format!("prompt blocked ({reason})"),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AtsError::EmptyResponse {
            provider: PROVIDER.into(),
            reason: "no candidates returned".into(),
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AtsError::EmptyResponse {
            provider: PROVIDER.into(),
            reason: format!(
                "finish reason {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    let usage = response.usage_metadata;
    Ok(ModelReply {
        text,
        input_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
        output_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
    })
}

/// Sampling settings copied out of [`AnalyzerConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GenerationSettings {
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// [`ModelClient`] for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    settings: GenerationSettings,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AtsError> {
        let timeout = Duration::from_secs(config.api_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AtsError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base_url.clone(),
            settings: GenerationSettings {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn transport_error(&self, e: reqwest::Error, start: Instant) -> AtsError {
        if e.is_timeout() {
            AtsError::ApiTimeout {
                provider: PROVIDER.into(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        } else {
            AtsError::Network {
                provider: PROVIDER.into(),
                detail: e.to_string(),
            }
        }
    }
}

/// Map a non-success HTTP status and body to an error.
pub(crate) fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> AtsError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AtsError::AuthError {
            provider: PROVIDER.into(),
            detail: message,
        },
        StatusCode::TOO_MANY_REQUESTS => AtsError::RateLimitExceeded {
            provider: PROVIDER.into(),
            retry_after_secs: retry_after,
        },
        // Gemini answers a bad key with 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if message.to_lowercase().contains("api key") => {
            AtsError::AuthError {
                provider: PROVIDER.into(),
                detail: message,
            }
        }
        _ => AtsError::LlmApiError {
            status: Some(status.as_u16()),
            message,
        },
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, AtsError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AtsError::AuthError {
            provider: PROVIDER.into(),
            detail: "no API key configured (set GOOGLE_API_KEY)".into(),
        })?;

        let body = build_request(&request, &self.settings);
        info!("Calling {} model {}", PROVIDER, self.model);

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, start))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, retry_after));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, start))?;
        let decoded: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| AtsError::MalformedResponse {
                provider: PROVIDER.into(),
                detail: e.to_string(),
            })?;

        let reply = reply_from_response(decoded)?;
        debug!(
            "{}: {:?} input tokens, {:?} output tokens, {:?}",
            PROVIDER,
            reply.input_tokens,
            reply.output_tokens,
            start.elapsed()
        );
        Ok(reply)
    }
}
