//! Uploaded résumé handling: ownership of the raw bytes and the cheap checks
//! that run before pdfium ever sees them.
//!
//! The bytes are owned by an [`UploadedDocument`] that is moved into the
//! converter and dropped when the request finishes; nothing is written to
//! disk. The `%PDF` magic is checked before pdfium is involved.

use crate::error::AtsError;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A résumé as received from the user.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    filename: Option<String>,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Whether an upload's declared name or content type says "PDF".
///
/// Mirrors the file picker's type restriction on the server side. Either
/// signal is enough; browsers do not always send a content type.
pub fn is_pdf_upload(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim())
        .is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
    let by_name = filename.is_some_and(|name| {
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
    });
    by_type || by_name
}

/// Verify the PDF magic bytes.
pub fn ensure_pdf(bytes: &[u8]) -> Result<(), AtsError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let magic = bytes.iter().take(PDF_MAGIC.len()).copied().collect();
        return Err(AtsError::NotAPdf { magic });
    }
    debug!("PDF magic OK ({} bytes)", bytes.len());
    Ok(())
}
