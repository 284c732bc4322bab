use super::form::AnalysisForm;
use super::page::{self, PageView, ResultArea};
use super::AppState;
use crate::error::{AtsError, ErrorKind};
use crate::service::Outcome;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, warn};

impl AtsError {
    /// HTTP status used when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AtsError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AtsError::ApiTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => match self.kind() {
                ErrorKind::MissingInput | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                ErrorKind::ConversionFailure => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::RemoteCallFailure => StatusCode::BAD_GATEWAY,
                ErrorKind::Configuration | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

fn log_failure(err: &AtsError) {
    match err.kind() {
        ErrorKind::Configuration | ErrorKind::Internal => error!("{}: {}", err.code(), err),
        _ => warn!("{}: {}", err.code(), err),
    }
}

impl IntoResponse for AtsError {
    fn into_response(self) -> Response {
        log_failure(&self);
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }));
        (self.status_code(), body).into_response()
    }
}

/// GET /
pub async fn index() -> (StatusCode, Html<String>) {
    page_response(StatusCode::OK, &PageView::empty())
}

/// POST /analyze
pub async fn analyze_form(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let form = match AnalysisForm::read(multipart, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(err) => return error_page("", None, &err),
    };

    let job_description = form.job_description.clone();
    let uploaded = form
        .document
        .as_ref()
        .map(|doc| doc.filename().unwrap_or("resume.pdf").to_string());

    let request = match form.into_request() {
        Ok(request) => request,
        Err(err) => return error_page(&job_description, uploaded.as_deref(), &err),
    };

    match state.service.handle(request).await {
        Ok(outcome) => page_response(
            StatusCode::OK,
            &PageView {
                job_description: &job_description,
                uploaded: uploaded.as_deref(),
                result: ResultArea::Outcome(&outcome),
            },
        ),
        Err(err) => error_page(&job_description, uploaded.as_deref(), &err),
    }
}

fn error_page(job_description: &str, uploaded: Option<&str>, err: &AtsError) -> (StatusCode, Html<String>) {
    log_failure(err);
    page_response(
        err.status_code(),
        &PageView {
            job_description,
            uploaded,
            result: ResultArea::Error(err),
        },
    )
}

fn page_response(status: StatusCode, view: &PageView<'_>) -> (StatusCode, Html<String>) {
    match page::render(view) {
        Ok(html) => (status, Html(html)),
        Err(err) => {
            log_failure(&err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("<!DOCTYPE html>\n<p>{}</p>\n", err.code())),
            )
        }
    }
}

/// POST /api/v1/analyze
pub async fn analyze_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Outcome>, AtsError> {
    let request = AnalysisForm::read(multipart, state.max_upload_bytes)
        .await?
        .into_request()?;
    let outcome = state.service.handle(request).await?;
    Ok(Json(outcome))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let dispatcher = state.service.dispatcher();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "provider": dispatcher.provider(),
        "model": dispatcher.model()
    }))
}
