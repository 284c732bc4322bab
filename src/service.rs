//! The per-action request handler.
//!
//! One button press maps to one [`AtsService::handle`] call:
//!
//! ```text
//! (job_description, document, action)
//!        │
//!        ├─ no document ───────────▶ Outcome::UploadRequired   (no remote call)
//!        ├─ convert first page ───▶ error                      (no remote call)
//!        └─ dispatch prompt ──────▶ Outcome::Completed | error
//! ```
//!
//! The service holds only read-only handles, so concurrent requests never
//! see each other.

use crate::config::AnalyzerConfig;
use crate::convert::DocumentConverter;
use crate::dispatch::AnalysisDispatcher;
use crate::error::AtsError;
use crate::output::AnalysisResult;
use crate::pipeline::input::UploadedDocument;
use crate::prompts::{AnalysisAction, UPLOAD_NOTICE};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument};

/// One user action: the two inputs plus the button that was pressed.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub job_description: String,
    pub document: Option<UploadedDocument>,
    pub action: AnalysisAction,
}

impl AnalysisRequest {
    pub fn new(
        job_description: impl Into<String>,
        document: Option<UploadedDocument>,
        action: AnalysisAction,
    ) -> Self {
        Self {
            job_description: job_description.into(),
            document,
            action,
        }
    }
}

/// What the user sees after an action that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No résumé was supplied; shown instead of a result.
    UploadRequired { notice: String },
    Completed(AnalysisResult),
}

impl Outcome {
    pub fn upload_required() -> Self {
        Outcome::UploadRequired {
            notice: UPLOAD_NOTICE.to_string(),
        }
    }

    /// Text to display: the notice or the verbatim reply.
    pub fn display_text(&self) -> &str {
        match self {
            Outcome::UploadRequired { notice } => notice,
            Outcome::Completed(result) => &result.text,
        }
    }
}

/// Conversion followed by dispatch.
#[derive(Debug, Clone)]
pub struct AtsService {
    converter: DocumentConverter,
    dispatcher: AnalysisDispatcher,
}

impl AtsService {
    pub fn new(converter: DocumentConverter, dispatcher: AnalysisDispatcher) -> Self {
        Self {
            converter,
            dispatcher,
        }
    }

    /// Build the pdfium converter and the configured model client.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AtsError> {
        Ok(Self::new(
            DocumentConverter::from_config(config),
            AnalysisDispatcher::from_config(config)?,
        ))
    }

    pub fn dispatcher(&self) -> &AnalysisDispatcher {
        &self.dispatcher
    }

    /// Run one action end to end.
    ///
    /// A missing document is not an error here: it yields
    /// [`Outcome::UploadRequired`] and the model is never called. Every other
    /// failure is returned as-is and ends the action.
    #[instrument(skip_all, fields(action = %request.action))]
    pub async fn handle(&self, request: AnalysisRequest) -> Result<Outcome, AtsError> {
        let start = Instant::now();
        let payload = match self.converter.convert(request.document).await {
            Ok(payload) => payload,
            Err(AtsError::MissingInput) => {
                info!("No résumé supplied, skipping model call");
                return Ok(Outcome::upload_required());
            }
            Err(e) => return Err(e),
        };

        let reply = self
            .dispatcher
            .dispatch(&request.job_description, &payload, request.action.prompt())
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "{} finished in {}ms ({} chars)",
            request.action.label(),
            duration_ms,
            reply.text.len()
        );

        Ok(Outcome::Completed(AnalysisResult {
            action: request.action,
            text: reply.text,
            provider: self.dispatcher.provider().to_string(),
            model: self.dispatcher.model().to_string(),
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            duration_ms,
        }))
    }
}
