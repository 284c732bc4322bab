//! Values produced by the pipeline: the image payload handed to the model and
//! the analysis returned to the user.

use crate::prompts::AnalysisAction;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

/// MIME type of every encoded page.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// One base64-encoded image with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ImagePart {
    pub mime_type: String,
    /// Standard (padded) base64 of the encoded image bytes.
    pub data: String,
}

impl ImagePart {
    pub fn jpeg(data: impl Into<String>) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE.to_string(),
            data: data.into(),
        }
    }
}

/// The image sequence sent to the model.
///
/// Always exactly one element: the first page of the résumé. The type holds a
/// single [`ImagePart`] rather than a `Vec`, so an empty or multi-page payload
/// cannot be constructed. It still serialises as a one-element JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    first_page: ImagePart,
}

impl ImagePayload {
    pub fn single(first_page: ImagePart) -> Self {
        Self { first_page }
    }

    /// The encoded first page.
    pub fn first_page(&self) -> &ImagePart {
        &self.first_page
    }

    pub fn as_slice(&self) -> &[ImagePart] {
        std::slice::from_ref(&self.first_page)
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Never true; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}

/// The model's reply for one action, plus bookkeeping.
///
/// `text` is the reply exactly as received. Nothing downstream parses or
/// rewrites it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct AnalysisResult {
    pub action: AnalysisAction,
    pub text: String,
    /// Backend that produced the reply, e.g. "gemini".
    pub provider: String,
    pub model: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    /// Wall-clock time of conversion plus model call.
    pub duration_ms: u64,
}
