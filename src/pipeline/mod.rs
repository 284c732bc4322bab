//! Pipeline stages for résumé analysis.
//!
//! Each submodule implements one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm / gemini
//! (bytes)   (pdfium)   (JPEG,     (one model call)
//!                       base64)
//! ```
//!
//! 1. [`input`]: own the uploaded bytes, check the `%PDF` magic
//! 2. [`render`]: rasterise page 0; blocking, run via `spawn_blocking`
//! 3. [`encode`]: JPEG-encode and base64-wrap the page
//! 4. [`llm`]: the [`llm::ModelClient`] seam and the `edgequake-llm`
//!    adapter
//! 5. [`gemini`]: the default client, Gemini's `generateContent` REST API

pub mod encode;
pub mod gemini;
pub mod input;
pub mod llm;
pub mod render;
