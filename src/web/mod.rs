//! HTTP surface: the résumé form and a JSON twin of it.
//!
//! | Route              | Method | Response                                   |
//! |--------------------|--------|--------------------------------------------|
//! | `/`                | GET    | Empty form                                 |
//! | `/analyze`         | POST   | Form plus the reply, notice or error       |
//! | `/api/v1/analyze`  | POST   | `Outcome` as JSON, or `{"error": {..}}`    |
//! | `/health`          | GET    | `{"status": "ok", ..}`                     |
//!
//! Both POST routes take the same multipart fields: `job_description`,
//! `resume` (one PDF) and `action` (`review` or `match`).

pub mod form;
pub mod handlers;
pub mod page;

use crate::config::AnalyzerConfig;
use crate::service::AtsService;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for the text fields and multipart framing on top of the PDF itself.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AtsService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: AtsService, max_upload_bytes: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, crate::error::AtsError> {
        Ok(Self::new(
            AtsService::from_config(config)?,
            config.max_upload_bytes,
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze_form))
        .route("/api/v1/analyze", post(handlers::analyze_json))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await
}
