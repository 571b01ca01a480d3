//! Rendering engines behind one capability interface.
//!
//! [`PdfImage`] is what callers program against. Two implementations exist:
//!
//! * [`GhostscriptPdfImage`] drives an external `gs` process and collects
//!   the JPEG files it writes;
//! * [`PdfiumPdfImage`] (feature `pdfium`) renders in-process through the
//!   pdfium library and can hand pages out lazily.
//!
//! The engine is chosen once, at construction, via [`EngineConfig`].

pub mod ghostscript;
#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use ghostscript::GhostscriptPdfImage;
#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumDocument, PdfiumPdfImage};

use crate::config::{GhostscriptConfig, SizeClass};
#[cfg(feature = "pdfium")]
use crate::config::PdfiumConfig;
use crate::descriptor::{ImageDescriptor, RenderedPages};
use crate::error::Pdf2ImgError;
use crate::pipeline::input::PdfInput;

/// Convert PDFs to images.
///
/// Engines are shareable across threads, so a runtime-selected engine can
/// be handed to [`crate::as_one_async`] and friends.
pub trait PdfImage: Send + Sync {
    /// One image per page, ordered by page number.
    fn as_one_per_page(
        &self,
        pdf: &PdfInput,
        size: SizeClass,
    ) -> Result<RenderedPages, Pdf2ImgError>;

    /// All pages stacked top to bottom in a single image.
    fn as_one(&self, pdf: &PdfInput, size: SizeClass) -> Result<ImageDescriptor, Pdf2ImgError>;

    /// Short engine name for logs.
    fn name(&self) -> &'static str;
}

/// Which engine to build, with its configuration.
#[derive(Debug, Clone)]
pub enum EngineConfig {
    Ghostscript(GhostscriptConfig),
    #[cfg(feature = "pdfium")]
    Pdfium(PdfiumConfig),
}

/// Build the engine selected by `config`.
pub fn build_engine(config: EngineConfig) -> Result<Box<dyn PdfImage>, Pdf2ImgError> {
    Ok(match config {
        EngineConfig::Ghostscript(c) => Box::new(GhostscriptPdfImage::new(c)?),
        #[cfg(feature = "pdfium")]
        EngineConfig::Pdfium(c) => Box::new(PdfiumPdfImage::new(c)?),
    })
}
