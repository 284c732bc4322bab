//! # ats-review
//!
//! Review a résumé PDF against a job description with a vision-capable LLM.
//!
//! The user pastes a job description, uploads a PDF and presses one of two
//! buttons. The first page of the PDF is rendered to a JPEG, sent to the model
//! together with the job description and a fixed prompt, and the reply is
//! shown exactly as the model wrote it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! (job description, PDF, action)
//!  │
//!  ├─ 1. Input     no file → "Please upload your resume." (no model call)
//!  ├─ 2. Convert   %PDF check, render page 0 via pdfium, JPEG + base64
//!  ├─ 3. Dispatch  [job description, image, prompt] → one model call
//!  └─ 4. Display   reply text, verbatim
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ats_review::{AnalysisAction, AnalysisRequest, AnalyzerConfig, AtsService, Outcome};
//! use ats_review::convert::read_document;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GOOGLE_API_KEY / GEMINI_API_KEY
//!     let config = AnalyzerConfig::from_env()?;
//!     let service = AtsService::from_config(&config)?;
//!
//!     let resume = read_document("resume.pdf").await?;
//!     let request = AnalysisRequest::new(
//!         "Senior backend engineer, 5 years Go experience",
//!         Some(resume),
//!         AnalysisAction::PercentageMatch,
//!     );
//!     if let Outcome::Completed(result) = service.handle(request).await? {
//!         println!("{}", result.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The axum web form ([`web`]) |
//! | `cli`    | on      | The `ats-review` binary (clap + anyhow + tracing-subscriber) |
//!
//! Library-only use:
//! ```toml
//! ats-review = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod service;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use convert::DocumentConverter;
pub use dispatch::AnalysisDispatcher;
pub use error::{AtsError, ErrorKind};
pub use output::{AnalysisResult, ImagePart, ImagePayload};
pub use pipeline::input::UploadedDocument;
pub use pipeline::llm::{ModelClient, ModelReply, ModelRequest};
pub use prompts::AnalysisAction;
pub use service::{AnalysisRequest, AtsService, Outcome};
