//! PDF rasterisation: render one page of an in-memory PDF via pdfium.
//!
//! The [`Rasterizer`] trait is the seam between the converter and the pdfium
//! C library. The converter only ever asks for page index 0, and the trait
//! makes that logic testable without a pdfium shared library on the machine.
//!
//! pdfium is blocking and keeps thread-local state, so callers run
//! [`Rasterizer::render_page`] inside `tokio::task::spawn_blocking`.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Renders a single page of a PDF held in memory.
pub trait Rasterizer: Send + Sync {
    /// Render the page at `index` (0-based).
    ///
    /// Fails with [`AtsError::PageOutOfRange`] when the document has no such
    /// page, including every index of a zero-page document.
    fn render_page(&self, pdf: &[u8], index: usize) -> Result<DynamicImage, AtsError>;
}

/// [`Rasterizer`] backed by pdfium-render.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    lib_path: Option<PathBuf>,
    max_rendered_pixels: u32,
    password: Option<String>,
}

impl PdfiumRasterizer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            lib_path: config.pdfium_lib_path.clone(),
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }

    /// Bind to pdfium: the configured directory if any, otherwise the working
    /// directory, then the system library path.
    fn bind(&self) -> Result<Pdfium, AtsError> {
        let bindings = match &self.lib_path {
            Some(dir) => bind_at(dir),
            None => bind_at(Path::new("./")).or_else(|_| {
                Pdfium::bind_to_system_library()
                    .map_err(|e| AtsError::PdfiumBindingFailed(format!("{e:?}")))
            }),
        }?;
        Ok(Pdfium::new(bindings))
    }
}

fn bind_at(dir: &Path) -> Result<Box<dyn PdfiumLibraryBindings>, AtsError> {
    let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
    Pdfium::bind_to_library(&lib).map_err(|e| {
        AtsError::PdfiumBindingFailed(format!("{:?}: {:?}", lib, e))
    })
}

impl Rasterizer for PdfiumRasterizer {
    fn render_page(&self, pdf: &[u8], index: usize) -> Result<DynamicImage, AtsError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        AtsError::WrongPassword
                    } else {
                        AtsError::PasswordRequired
                    }
                } else {
                    AtsError::CorruptPdf { detail: err_str }
                }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        if index >= total_pages {
            return Err(AtsError::PageOutOfRange {
                page: index + 1,
                total: total_pages,
            });
        }

        let page = pages
            .get(index as u16)
            .map_err(|e| AtsError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_rendered_pixels as i32)
            .set_maximum_height(self.max_rendered_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            AtsError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );

        Ok(image)
    }
}
