//! Configuration for résumé analysis.
//!
//! Everything that is process-wide lives in [`AnalyzerConfig`]: the model
//! credential, which model and provider to call, and the rendering knobs of
//! the document converter. It is built once at start-up, either through
//! [`AnalyzerConfig::builder()`] or [`AnalyzerConfig::from_env()`], and is
//! read-only afterwards. Components receive it explicitly in their
//! constructors; nothing reads the environment behind the caller's back.
//!
//! A missing API key is *not* a build error. The form must still load and
//! the upload notice must still work without one, so the absence only shows
//! up as an authentication error on the first remote call.

use crate::error::AtsError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Gemini model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default base URL of the Gemini REST API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted by [`AnalyzerConfig::from_env`], in order
/// of precedence for the API key.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Configuration for the document converter and the analysis dispatcher.
///
/// # Example
/// ```rust
/// use ats_review::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("test-key")
///     .model("gemini-1.5-flash")
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// assert_eq!(config.jpeg_quality, 85);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Credential for the Gemini API. `None` surfaces as an auth error on the
    /// first call, not at start-up.
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Named `edgequake-llm` provider (e.g. "openai", "anthropic", "ollama").
    /// `None` or `"gemini"` selects the built-in Gemini REST client.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_GEMINI_BASE_URL`].
    pub api_base_url: String,

    /// Sampling temperature. `None` keeps the model's default.
    pub temperature: Option<f32>,

    /// Maximum output tokens. `None` keeps the model's default.
    pub max_tokens: Option<usize>,

    /// Process-level HTTP timeout for one model call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Longest edge of the rendered first page, in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// JPEG quality (1–100) of the encoded page. Default: 90.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted résumés.
    pub password: Option<String>,

    /// Directory containing the pdfium shared library. `None` looks next to
    /// the executable's working directory, then in the system library path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    pub max_upload_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            api_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
            api_timeout_secs: 120,
            max_rendered_pixels: 2000,
            jpeg_quality: 90,
            password: None,
            pdfium_lib_path: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GOOGLE_API_KEY`, then `GEMINI_API_KEY` | `api_key` |
    /// | `ATS_MODEL` | `model` |
    /// | `ATS_PROVIDER` | `provider_name` |
    /// | `PDFIUM_LIB_PATH` | `pdfium_lib_path` |
    pub fn from_env() -> Result<Self, AtsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AtsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(key) = API_KEY_VARS.iter().find_map(|k| non_empty(*k)) {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty("ATS_MODEL") {
            builder = builder.model(model);
        }
        if let Some(provider) = non_empty("ATS_PROVIDER") {
            builder = builder.provider_name(provider);
        }
        if let Some(path) = non_empty("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_lib_path(path);
        }
        builder.build()
    }

    /// Name of the backend that will serve model calls.
    pub fn backend_name(&self) -> &str {
        if self.provider.is_some() {
            "custom"
        } else {
            self.provider_name.as_deref().unwrap_or("gemini")
        }
    }

    /// True when the built-in Gemini REST client handles model calls.
    pub fn uses_builtin_gemini(&self) -> bool {
        self.provider.is_none()
            && self
                .provider_name
                .as_deref()
                .map_or(true, |p| p.eq_ignore_ascii_case("gemini"))
    }
}

/// Builder for [`AnalyzerConfig`].
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl fmt::Debug for AnalyzerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalyzerConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AtsError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AtsError::InvalidConfig("model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(AtsError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(AtsError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(AtsError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}
