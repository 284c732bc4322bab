//! Document conversion: uploaded PDF bytes → single-page image payload.
//!
//! Only the first page is ever rendered; later pages are never read.
//!
//! Failures are never softened into a blank payload. A missing upload is
//! [`AtsError::MissingInput`]; a non-PDF, corrupt, locked or zero-page
//! document fails before any model call is attempted.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use crate::output::ImagePayload;
use crate::pipeline::encode;
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Index of the only page that is converted.
pub const FIRST_PAGE: usize = 0;

/// Turns an uploaded résumé into the [`ImagePayload`] sent to the model.
#[derive(Clone)]
pub struct DocumentConverter {
    rasterizer: Arc<dyn Rasterizer>,
    jpeg_quality: u8,
}

impl std::fmt::Debug for DocumentConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentConverter")
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl DocumentConverter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, jpeg_quality: u8) -> Self {
        Self {
            rasterizer,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Converter backed by pdfium, configured from `config`.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(Arc::new(PdfiumRasterizer::new(config)), config.jpeg_quality)
    }

    /// Convert the first page of `document` into a one-element payload.
    ///
    /// # Errors
    /// - [`AtsError::MissingInput`] when `document` is `None`
    /// - [`AtsError::NotAPdf`] when the bytes lack the `%PDF` header
    /// - [`AtsError::PageOutOfRange`] for a zero-page document
    /// - any rasterisation or encoding failure
    pub async fn convert(&self, document: Option<UploadedDocument>) -> Result<ImagePayload, AtsError> {
        let document = document.ok_or(AtsError::MissingInput)?;
        let start = Instant::now();
        input::ensure_pdf(document.bytes())?;

        let rasterizer = Arc::clone(&self.rasterizer);
        let bytes = document.into_bytes();
        let image = tokio::task::spawn_blocking(move || rasterizer.render_page(&bytes, FIRST_PAGE))
            .await
            .map_err(|e| AtsError::Internal(format!("Render task panicked: {}", e)))??;

        let part = encode::encode_jpeg(&image, self.jpeg_quality).map_err(|e| {
            AtsError::ImageEncodingFailed {
                detail: e.to_string(),
            }
        })?;
        info!(
            "Converted first page in {}ms ({} bytes base64)",
            start.elapsed().as_millis(),
            part.data.len()
        );

        Ok(ImagePayload::single(part))
    }

    /// Read a PDF from disk and convert it. Used by the one-shot CLI.
    pub async fn convert_file(&self, path: impl AsRef<Path>) -> Result<ImagePayload, AtsError> {
        let document = read_document(path).await?;
        self.convert(Some(document)).await
    }
}

/// Load a résumé from disk into an [`UploadedDocument`].
pub async fn read_document(path: impl AsRef<Path>) -> Result<UploadedDocument, AtsError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AtsError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => AtsError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    let mut document = UploadedDocument::new(bytes);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        document = document.with_filename(name);
    }
    Ok(document)
}
