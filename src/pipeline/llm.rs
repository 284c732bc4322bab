//! Model interaction: the [`ModelClient`] seam and its `edgequake-llm` adapter.
//!
//! A request is always the same ordered triple: job description text, the
//! first-page image, prompt text. Each client maps that triple onto its wire
//! format and returns the reply text untouched.
//!
//! No retry loop: one action makes one call, and a failure goes straight
//! back to the user.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use crate::output::ImagePart;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// The three ordered parts of one model request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub job_description: &'a str,
    pub image: &'a ImagePart,
    pub prompt: &'a str,
}

/// A model reply. `text` is passed on verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_tokens: None,
            output_tokens: None,
        }
    }
}

/// A remote generative model able to read one image alongside text.
///
/// Implementations hold only read-only configuration, so a failed call leaves
/// nothing behind that could affect the next one.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Backend name used in logs and error messages, e.g. "gemini".
    fn provider(&self) -> &str;

    /// Model identifier.
    fn model(&self) -> &str;

    /// Send one request and return the reply.
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, AtsError>;
}

/// [`ModelClient`] over any `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    provider_label: String,
    model: String,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderClient {
    /// Wrap an already-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            provider_label: label.into(),
            model: config.model.clone(),
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Build the named provider through [`ProviderFactory`], which reads the
    /// provider's own API key variable (`OPENAI_API_KEY`, …).
    pub fn from_name(name: &str, config: &AnalyzerConfig) -> Result<Self, AtsError> {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            AtsError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, name, config))
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    fn provider(&self) -> &str {
        &self.provider_label
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, AtsError> {
        let image = ImageData::new(request.image.data.clone(), request.image.mime_type.clone());
        let messages = vec![
            ChatMessage::user_with_images(request.job_description, vec![image]),
            ChatMessage::user(request.prompt),
        ];

        let start = Instant::now();
        let response = tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| AtsError::ApiTimeout {
            provider: self.provider_label.clone(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })?
        .map_err(|e| classify_provider_error(&self.provider_label, &e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.provider_label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.is_empty() {
            return Err(AtsError::EmptyResponse {
                provider: self.provider_label.clone(),
                reason: "reply contained no text".into(),
            });
        }

        Ok(ModelReply {
            text: response.content,
            input_tokens: Some(response.prompt_tokens as u64),
            output_tokens: Some(response.completion_tokens as u64),
        })
    }
}

/// Build `CompletionOptions` from the analyzer config.
fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Map a provider error message onto the remote-failure variants.
///
/// `edgequake-llm` errors arrive as display strings from many backends, so
/// this matches on the status codes and phrases they have in common.
pub(crate) fn classify_provider_error(provider: &str, message: &str) -> AtsError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
        AtsError::RateLimitExceeded {
            provider: provider.to_string(),
            retry_after_secs: None,
        }
    } else if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("api key")
    {
        AtsError::AuthError {
            provider: provider.to_string(),
            detail: message.to_string(),
        }
    } else if lower.contains("timed out") || lower.contains("timeout") {
        AtsError::ApiTimeout {
            provider: provider.to_string(),
            elapsed_ms: 0,
        }
    } else {
        AtsError::LlmApiError {
            status: None,
            message: message.to_string(),
        }
    }
}

/// Choose the model client for a configuration.
///
/// 1. a pre-built provider in `config.provider` is used as-is;
/// 2. `provider_name` other than "gemini" goes through [`ProviderFactory`];
/// 3. otherwise the built-in Gemini REST client, with the explicit API key.
pub fn client_from_config(config: &AnalyzerConfig) -> Result<Arc<dyn ModelClient>, AtsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(
            Arc::clone(provider),
            config.backend_name(),
            config,
        )));
    }
    if !config.uses_builtin_gemini() {
        let name = config.backend_name().to_string();
        return Ok(Arc::new(ProviderClient::from_name(&name, config)?));
    }
    Ok(Arc::new(crate::pipeline::gemini::GeminiClient::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults_to_provider_defaults() {
        let config = AnalyzerConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn build_options_carries_overrides() {
        let config = AnalyzerConfig::builder()
            .temperature(0.4)
            .max_tokens(2048)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.4));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn provider_errors_classified() {
        assert!(matches!(
            classify_provider_error("openai", "HTTP 429 Too Many Requests"),
            AtsError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            classify_provider_error("openai", "401 Unauthorized: invalid API key"),
            AtsError::AuthError { .. }
        ));
        assert!(matches!(
            classify_provider_error("ollama", "connection refused"),
            AtsError::LlmApiError { .. }
        ));
    }

    #[test]
    fn gemini_is_the_default_client() {
        let config = AnalyzerConfig::builder().api_key("k").build().unwrap();
        let client = client_from_config(&config).unwrap();
        assert_eq!(client.provider(), "gemini");
        assert_eq!(client.model(), "gemini-1.5-flash");
    }
}
