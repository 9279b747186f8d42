//! PDF rasterisation: render one page to a `DynamicImage` via pdfium.
//!
//! ## Why scale by factor, not DPI?
//!
//! A PDF point is 1/72 inch, so rendering at factor 1.0 gives one pixel per
//! point. Scaling both axes by a fixed factor (2.0 by default) keeps the
//! output dimensions a simple function of the page size,
//! `native_points × zoom`, which is what downstream checks rely on.
//!
//! ## Blocking
//!
//! Rendering runs synchronously on the calling thread. Documents are handled
//! strictly one at a time, so there is no other work for the runtime to
//! schedule while a page is being rasterised.
//!
//! [`PageRenderer`] is the seam the driver uses; [`PdfiumRenderer`] is the
//! real implementation and tests substitute their own.

use crate::error::{PipelineError, RenderError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One rasterised page plus the geometry it came from.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Pages in the source document.
    pub page_count: usize,
    /// Native page width in PDF points.
    pub width_pt: f32,
    /// Native page height in PDF points.
    pub height_pt: f32,
}

/// Opens a document and rasterises one page of it.
pub trait PageRenderer {
    /// Render the 0-based `page_index` of the document at `path`.
    ///
    /// Returns [`RenderError::Open`] when the file cannot be loaded as a
    /// document; every other variant means the document opened but the page
    /// could not be produced.
    fn render_page(&self, path: &Path, page_index: usize) -> Result<RenderedPage, RenderError>;
}

/// [`PageRenderer`] backed by the pdfium C++ library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    zoom: f32,
}

impl PdfiumRenderer {
    /// Wrap a bound pdfium instance. `zoom` goes through [`validate_zoom`].
    pub fn new(pdfium: Pdfium, zoom: f32) -> Result<Self, PipelineError> {
        Ok(Self {
            pdfium,
            zoom: validate_zoom(zoom)?,
        })
    }

    /// Bind pdfium (see [`bind_pdfium`]) and wrap it.
    pub fn bind(zoom: f32) -> Result<Self, PipelineError> {
        let zoom = validate_zoom(zoom)?;
        Self::new(bind_pdfium()?, zoom)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(&self, path: &Path, page_index: usize) -> Result<RenderedPage, RenderError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| RenderError::Open(format!("{:?}", e)))?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        if page_count > 1 {
            warn!(
                "{} has {} pages; only page {} is rendered",
                path.display(),
                page_count,
                page_index + 1
            );
        }
        if page_index >= page_count {
            return Err(RenderError::PageOutOfRange {
                index: page_index,
                total: page_count,
            });
        }

        let page = pages
            .get(page_index as u16)
            .map_err(|e| RenderError::Rasterisation(format!("{:?}", e)))?;

        let width_pt = page.width().value;
        let height_pt = page.height().value;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.zoom);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RenderError::Rasterisation(format!("{:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered {} page {} ({}x{} pt) → {}x{} px",
            path.display(),
            page_index + 1,
            width_pt,
            height_pt,
            image.width(),
            image.height()
        );

        Ok(RenderedPage {
            image,
            page_count,
            width_pt,
            height_pt,
        })
    }
}

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// Reject non-finite or non-positive zoom factors and clamp the rest to
/// `MIN_ZOOM..=MAX_ZOOM`, matching [`crate::PipelineConfigBuilder::zoom`].
pub fn validate_zoom(zoom: f32) -> Result<f32, PipelineError> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "zoom must be a positive number, got {zoom}"
        )));
    }
    Ok(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// Environment variable naming an existing libpdfium to load.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_LIB_PATH` — full path to the library file
/// 2. the platform library name in the working directory (`./libpdfium.so`)
/// 3. system library paths
pub fn bind_pdfium() -> Result<Pdfium, PipelineError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(p) if !p.is_empty() => {
            let lib_path = PathBuf::from(p);
            debug!("Binding pdfium from {}", lib_path.display());
            Pdfium::bind_to_library(&lib_path)
        }
        _ => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PipelineError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
