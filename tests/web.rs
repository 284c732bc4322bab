//! Router tests: multipart form in, HTML or JSON out.
//!
//! The pdfium rasteriser and the model client are replaced by in-process
//! stubs, so these run without a pdfium library or network access.

#![cfg(feature = "server")]

use async_trait::async_trait;
use ats_review::pipeline::render::Rasterizer;
use ats_review::prompts::{MATCH_PERCENTAGE_PROMPT, RESUME_EVALUATION_PROMPT};
use ats_review::web::{build_router, AppState};
use ats_review::{
    AnalysisDispatcher, AtsError, AtsService, DocumentConverter, ModelClient, ModelReply,
    ModelRequest,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, RgbImage};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ── Stubs ────────────────────────────────────────────────────────────────────

struct StubPages(usize);

impl Rasterizer for StubPages {
    fn render_page(&self, _pdf: &[u8], index: usize) -> Result<DynamicImage, AtsError> {
        if index >= self.0 {
            return Err(AtsError::PageOutOfRange {
                page: index + 1,
                total: self.0,
            });
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::new(85, 110)))
    }
}

#[derive(Default)]
struct StubModel {
    reply: String,
    /// Number of leading calls that fail with a rate-limit error.
    failures: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ModelClient for StubModel {
    fn provider(&self) -> &str {
        "stub"
    }
    fn model(&self) -> &str {
        "stub-vision"
    }
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, AtsError> {
        self.calls.lock().unwrap().push((
            request.job_description.to_string(),
            request.prompt.to_string(),
        ));
        let fail_this_call = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail_this_call {
            return Err(AtsError::RateLimitExceeded {
                provider: "stub".into(),
                retry_after_secs: Some(10),
            });
        }
        Ok(ModelReply::text(self.reply.clone()))
    }
}

struct Harness {
    app: Router,
    model: Arc<StubModel>,
}

fn harness_with(pages: usize, model: StubModel, max_upload_bytes: usize) -> Harness {
    let model = Arc::new(model);
    let service = AtsService::new(
        DocumentConverter::new(Arc::new(StubPages(pages)), 90),
        AnalysisDispatcher::new(model.clone()),
    );
    Harness {
        app: build_router(AppState::new(service, max_upload_bytes)),
        model,
    }
}

fn harness(reply: &str) -> Harness {
    harness_with(
        3,
        StubModel {
            reply: reply.to_string(),
            ..Default::default()
        },
        1024 * 1024,
    )
}

impl Harness {
    fn calls(&self) -> Vec<(String, String)> {
        self.model.calls.lock().unwrap().clone()
    }
}

// ── Multipart helpers ────────────────────────────────────────────────────────

const BOUNDARY: &str = "----ats-review-test-boundary";
const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn resume(bytes: &[u8]) -> Part<'_> {
    Part::File {
        name: "resume",
        filename: "resume.pdf",
        content_type: "application/pdf",
        bytes,
    }
}

/// What a browser sends when no file was picked.
fn no_file() -> Part<'static> {
    Part::File {
        name: "resume",
        filename: "",
        content_type: "application/octet-stream",
        bytes: b"",
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post(app: &Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ── HTML form ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_renders_empty_form() {
    let h = harness("unused");
    let (status, html) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h1>AI Resume ATS</h1>"));
    assert!(html.contains("Provide Job Description"));
    assert!(html.contains("accept=\"application/pdf,.pdf\""));
    assert!(html.contains(">Review the Resume</button>"));
    assert!(html.contains(">Percentage Match</button>"));
}

#[tokio::test]
async fn missing_file_shows_notice_without_model_call() {
    for action in ["review", "match"] {
        let h = harness("unused");
        let (status, html) = post(
            &h.app,
            "/analyze",
            &[
                Part::Text("job_description", "Data engineer"),
                no_file(),
                Part::Text("action", action),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Please upload your resume."));
        assert!(!html.contains("Resume PDF uploaded successfully!"));
        assert!(h.calls().is_empty(), "no model call for '{action}'");
    }
}

#[tokio::test]
async fn percentage_match_reply_shown_verbatim() {
    let reply = "Match: 68%\nMissing keywords: Kubernetes, Terraform\nFinal thoughts: strong Go background.";
    let h = harness(reply);
    let jd = "Senior backend engineer, 5 years Go experience";
    let (status, html) = post(
        &h.app,
        "/analyze",
        &[
            Part::Text("job_description", jd),
            resume(PDF_BYTES),
            Part::Text("action", "match"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Resume PDF uploaded successfully!"));
    assert!(html.contains("<h2>Percentage Match Response</h2>"));
    assert!(html.contains(&format!("<pre>{reply}</pre>")));
    assert!(html.contains(jd), "job description echoed into the form");
    assert_eq!(h.calls(), vec![(jd.to_string(), MATCH_PERCENTAGE_PROMPT.to_string())]);
}

#[tokio::test]
async fn both_actions_in_one_post_run_exactly_one() {
    let h = harness("Strengths: ...");
    let (status, html) = post(
        &h.app,
        "/analyze",
        &[
            Part::Text("job_description", "JD"),
            resume(PDF_BYTES),
            Part::Text("action", "review"),
            Part::Text("action", "match"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h2>Resume Evaluation Response</h2>"));
    assert!(!html.contains("Percentage Match Response"));
    let calls = h.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, RESUME_EVALUATION_PROMPT);
}

#[tokio::test]
async fn non_pdf_upload_rejected() {
    let h = harness("unused");
    let (status, html) = post(
        &h.app,
        "/analyze",
        &[
            Part::File {
                name: "resume",
                filename: "resume.docx",
                content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                bytes: b"PK\x03\x04docx",
            },
            Part::Text("action", "review"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("data-code=\"INVALID_REQUEST\""));
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn oversized_upload_rejected() {
    let h = harness_with(1, StubModel::default(), 16);
    let (status, _) = post(
        &h.app,
        "/analyze",
        &[resume(PDF_BYTES), Part::Text("action", "match")],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn zero_page_pdf_fails_before_model_call() {
    let h = harness_with(0, StubModel::default(), 1024 * 1024);
    let (status, html) = post(
        &h.app,
        "/analyze",
        &[resume(PDF_BYTES), Part::Text("action", "review")],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("data-code=\"CONVERSION_FAILURE\""));
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn missing_action_is_bad_request() {
    let h = harness("unused");
    let (status, _) = post(&h.app, "/analyze", &[resume(PDF_BYTES)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn failed_call_does_not_poison_the_next() {
    let h = harness_with(
        1,
        StubModel {
            reply: "second time lucky".into(),
            failures: AtomicUsize::new(1),
            ..Default::default()
        },
        1024 * 1024,
    );
    let form = [
        Part::Text("job_description", "Go developer"),
        resume(PDF_BYTES),
        Part::Text("action", "match"),
    ];

    let (status, html) = post(&h.app, "/analyze", &form).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(html.contains("data-code=\"REMOTE_CALL_FAILURE\""));
    assert!(!html.contains("class=\"result\""));
    // Nothing retried behind the user's back.
    assert_eq!(h.calls().len(), 1);

    // Same router, same form, resubmitted.
    let (status, html) = post(&h.app, "/analyze", &form).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h2>Percentage Match Response</h2>"));
    assert!(html.contains("<pre>second time lucky</pre>"));
    assert!(!html.contains("class=\"error\""));

    let calls = h.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[1].0, "Go developer");
    assert_eq!(calls[1].1, MATCH_PERCENTAGE_PROMPT);
}

// ── JSON API ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn json_endpoint_returns_completed_outcome() {
    let h = harness("Match: 90%");
    let (status, body) = post(
        &h.app,
        "/api/v1/analyze",
        &[
            Part::Text("job_description", "Rust engineer"),
            resume(PDF_BYTES),
            Part::Text("action", "match"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["action"], "match");
    assert_eq!(json["text"], "Match: 90%");
    assert_eq!(json["provider"], "stub");
    assert_eq!(json["model"], "stub-vision");
}

#[tokio::test]
async fn json_endpoint_upload_required() {
    let h = harness("unused");
    let (status, body) = post(
        &h.app,
        "/api/v1/analyze",
        &[no_file(), Part::Text("action", "review")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["outcome"], "upload_required");
    assert_eq!(json["notice"], "Please upload your resume.");
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn json_endpoint_error_envelope() {
    let h = harness_with(
        1,
        StubModel {
            failures: AtomicUsize::new(1),
            ..Default::default()
        },
        1024 * 1024,
    );
    let (status, body) = post(
        &h.app,
        "/api/v1/analyze",
        &[resume(PDF_BYTES), Part::Text("action", "review")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "REMOTE_CALL_FAILURE");
    assert!(json["error"]["message"].as_str().unwrap().contains("stub"));
}

#[tokio::test]
async fn health_reports_backend() {
    let h = harness("unused");
    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "ats-review");
    assert_eq!(json["provider"], "stub");
}
