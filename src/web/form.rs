//! Multipart form decoding.
//!
//! The file picker only restricts the file *type*. Everything else (empty
//! job description, no file at all) is passed through and dealt with by the
//! service.

use crate::error::AtsError;
use crate::pipeline::input::{self, UploadedDocument};
use crate::prompts::AnalysisAction;
use crate::service::AnalysisRequest;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::debug;

pub const JOB_DESCRIPTION_FIELD: &str = "job_description";
pub const RESUME_FIELD: &str = "resume";
pub const ACTION_FIELD: &str = "action";

/// Decoded form fields, before an action is chosen.
#[derive(Debug, Default)]
pub struct AnalysisForm {
    pub job_description: String,
    pub document: Option<UploadedDocument>,
    /// Every `action` value, in submission order.
    pub actions: Vec<String>,
}

impl AnalysisForm {
    /// Read all fields from `multipart`.
    ///
    /// Unknown fields are skipped. A file field with no bytes is what
    /// browsers send when nothing was picked, so it counts as no document.
    pub async fn read(mut multipart: Multipart, max_upload_bytes: usize) -> Result<Self, AtsError> {
        let mut form = AnalysisForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                JOB_DESCRIPTION_FIELD => {
                    form.job_description = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_upload_bytes))?;
                }
                RESUME_FIELD => {
                    form.document = read_document(field, max_upload_bytes).await?;
                }
                ACTION_FIELD => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_upload_bytes))?;
                    form.actions.push(value);
                }
                other => debug!("Ignoring form field '{}'", other),
            }
        }
        Ok(form)
    }

    /// The single action to run.
    pub fn action(&self) -> Result<AnalysisAction, AtsError> {
        AnalysisAction::select(&self.actions).ok_or_else(|| {
            AtsError::InvalidForm(format!(
                "choose '{}' or '{}'",
                AnalysisAction::Review.label(),
                AnalysisAction::PercentageMatch.label()
            ))
        })
    }

    pub fn into_request(self) -> Result<AnalysisRequest, AtsError> {
        let action = self.action()?;
        Ok(AnalysisRequest::new(self.job_description, self.document, action))
    }
}

async fn read_document(
    field: Field<'_>,
    max_upload_bytes: usize,
) -> Result<Option<UploadedDocument>, AtsError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.is_empty());
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?;

    if bytes.is_empty() {
        return Ok(None);
    }
    if !input::is_pdf_upload(filename.as_deref(), content_type.as_deref()) {
        return Err(AtsError::UnsupportedFileType {
            filename: filename.unwrap_or_else(|| "(unnamed)".to_string()),
        });
    }
    if bytes.len() > max_upload_bytes {
        return Err(AtsError::UploadTooLarge {
            limit: max_upload_bytes,
        });
    }

    debug!("Received {} byte upload", bytes.len());
    let mut document = UploadedDocument::new(bytes.to_vec());
    if let Some(name) = filename {
        document = document.with_filename(name);
    }
    Ok(Some(document))
}

fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> AtsError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AtsError::UploadTooLarge {
            limit: max_upload_bytes,
        }
    } else {
        AtsError::InvalidForm(err.body_text())
    }
}
