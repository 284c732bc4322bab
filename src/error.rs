//! Error types for the ats-review library.
//!
//! Every failure of a single analysis request is an [`AtsError`]. None of them
//! are recoverable inside the request: the caller shows the message and the
//! user triggers the action again.
//!
//! [`AtsError::kind`] folds the variants into the coarse [`ErrorKind`] groups
//! the front-ends care about: whether to show the upload notice, a conversion
//! problem, or a failure of the remote model.

use thiserror::Error;

/// All errors returned by the ats-review library.
#[derive(Debug, Error)]
pub enum AtsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No résumé was supplied for an action that needs one.
    #[error("No PDF file was uploaded.")]
    MissingInput,

    /// A résumé path given on the command line does not exist.
    #[error("PDF file not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: std::path::PathBuf },

    /// The upload does not look like a PDF (wrong extension or content type).
    #[error("Unsupported file '{filename}': only PDF résumés are accepted")]
    UnsupportedFileType { filename: String },

    /// The bytes were read, but they are not a PDF.
    #[error("File is not a valid PDF.\nFirst bytes: {magic:?}")]
    NotAPdf { magic: Vec<u8> },

    /// The upload exceeded the configured size limit.
    #[error("Upload too large: limit is {limit} bytes")]
    UploadTooLarge { limit: usize },

    /// The submitted form could not be parsed.
    #[error("Invalid form submission: {0}")]
    InvalidForm(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nUpload a copy of the résumé without password protection.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// The requested page does not exist (a zero-page document has no page 1).
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered page could not be encoded as JPEG.
    #[error("JPEG encoding failed: {detail}")]
    ImageEncodingFailed { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide,\n\
or set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Remote model errors ───────────────────────────────────────────────
    /// The configured provider could not be built (unknown name, missing key…).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API rejected the credentials (401/403) or none were set.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The model API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The model call did not complete within the HTTP timeout.
    #[error("API call to '{provider}' timed out after {elapsed_ms}ms")]
    ApiTimeout { provider: String, elapsed_ms: u64 },

    /// Network-level failure reaching the model API.
    #[error("Could not reach provider '{provider}': {detail}")]
    Network { provider: String, detail: String },

    /// The model API returned any other error.
    #[error("LLM API error{}: {message}", http_status_suffix(.status))]
    LlmApiError {
        status: Option<u16>,
        message: String,
    },

    /// The reply body could not be decoded.
    #[error("Malformed response from provider '{provider}': {detail}")]
    MalformedResponse { provider: String, detail: String },

    /// The model answered without any text (blocked prompt, safety stop…).
    #[error("Provider '{provider}' returned no text: {reason}")]
    EmptyResponse { provider: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn http_status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Coarse classification of an [`AtsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No document was supplied; the user should upload one.
    MissingInput,
    /// The request itself was malformed (bad form, wrong file type, too large).
    InvalidRequest,
    /// The document could not be turned into an image payload.
    ConversionFailure,
    /// The remote model call failed.
    RemoteCallFailure,
    /// The service is misconfigured.
    Configuration,
    /// Anything else.
    Internal,
}

impl AtsError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use AtsError::*;
        match self {
            MissingInput => ErrorKind::MissingInput,
            FileNotFound { .. }
            | UnsupportedFileType { .. }
            | UploadTooLarge { .. }
            | InvalidForm(_) => ErrorKind::InvalidRequest,
            NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired
            | WrongPassword
            | PageOutOfRange { .. }
            | RasterisationFailed { .. }
            | ImageEncodingFailed { .. }
            | PdfiumBindingFailed(_) => ErrorKind::ConversionFailure,
            AuthError { .. }
            | RateLimitExceeded { .. }
            | ApiTimeout { .. }
            | Network { .. }
            | LlmApiError { .. }
            | MalformedResponse { .. }
            | EmptyResponse { .. } => ErrorKind::RemoteCallFailure,
            ProviderNotConfigured { .. } | InvalidConfig(_) => ErrorKind::Configuration,
            Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code used by the JSON API.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::MissingInput => "MISSING_INPUT",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::ConversionFailure => "CONVERSION_FAILURE",
            ErrorKind::RemoteCallFailure => "REMOTE_CALL_FAILURE",
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}
