//! Native engine: render pages in-process through pdfium.
//!
//! Pages are rendered at `dpi / 72` times their size in PDF points, rounded
//! to whole pixels, so an A4 page at 100 DPI is 827×1169 and at 12 DPI is
//! 99×140. Nothing touches the file system except the encoded output
//! streams, which are anonymous temp files.
//!
//! [`PdfiumPdfImage::open`] exposes the document as a lazy page cursor:
//! [`PdfiumDocument::pages`] renders and encodes one page per `next()`, so
//! peak memory is one page rather than the whole document.

use crate::config::{PdfiumConfig, SizeClass};
use crate::descriptor::{ImageDescriptor, PageImage, RenderedPages};
use crate::engine::PdfImage;
use crate::error::Pdf2ImgError;
use crate::pipeline::composite::Canvas;
use crate::pipeline::encode;
use crate::pipeline::input::PdfInput;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const POINTS_PER_INCH: f32 = 72.0;

/// pdfium-backed [`PdfImage`].
pub struct PdfiumPdfImage {
    pdfium: Pdfium,
    config: PdfiumConfig,
}

impl PdfiumPdfImage {
    /// Bind the pdfium library. The output format was already checked by
    /// [`crate::PdfiumConfigBuilder::build`].
    pub fn new(config: PdfiumConfig) -> Result<Self, Pdf2ImgError> {
        let bindings = bind(config.library_path.as_deref())?;
        info!(
            "pdfium engine: {} output, quality {}",
            config.output_format, config.quality
        );
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            config,
        })
    }

    pub fn config(&self) -> &PdfiumConfig {
        &self.config
    }

    /// Open `pdf` for rendering at the DPI of `size`.
    pub fn open(&self, pdf: &PdfInput, size: SizeClass) -> Result<PdfiumDocument<'_>, Pdf2ImgError> {
        pdf.validate()?;
        let source = pdf.describe();
        let loaded = match pdf {
            PdfInput::Path(path) => self.pdfium.load_pdf_from_file(path, None),
            PdfInput::Bytes(bytes) => self.pdfium.load_pdf_from_byte_vec(bytes.clone(), None),
        };
        let document = loaded.map_err(|e| Pdf2ImgError::CorruptPdf {
            path: PathBuf::from(&source),
            detail: format!("{:?}", e),
        })?;

        let dpi = self.config.dpi.dpi(size);
        info!(
            "PDF loaded: {} ({} pages) at {} DPI",
            source,
            document.pages().len(),
            dpi
        );
        Ok(PdfiumDocument {
            document,
            dpi,
            config: &self.config,
        })
    }
}

impl PdfImage for PdfiumPdfImage {
    fn as_one_per_page(
        &self,
        pdf: &PdfInput,
        size: SizeClass,
    ) -> Result<RenderedPages, Pdf2ImgError> {
        let document = self.open(pdf, size)?;
        let pages = document.pages().collect::<Result<Vec<_>, _>>()?;
        Ok(RenderedPages::new(pages, None))
    }

    /// The canvas is sized from page geometry, then pages are rendered and
    /// painted one at a time.
    fn as_one(&self, pdf: &PdfInput, size: SizeClass) -> Result<ImageDescriptor, Pdf2ImgError> {
        let document = self.open(pdf, size)?;
        let sizes = (0..document.page_count())
            .map(|i| document.page_size(i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut canvas = Canvas::for_pages(sizes, self.config.composite_inset)?;
        for idx in 0..document.page_count() {
            canvas.paint(&document.render_image(idx)?);
        }
        encode::encode_image(&canvas.finish(), self.config.output_format, self.config.quality)
    }

    fn name(&self) -> &'static str {
        "pdfium"
    }
}

/// An open PDF, ready to render page by page.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    dpi: u32,
    config: &'a PdfiumConfig,
}

impl<'a> PdfiumDocument<'a> {
    pub fn page_count(&self) -> u16 {
        self.document.pages().len()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Lazily render and encode each page in order. The iterator is
    /// finite; call `pages()` again to start over.
    pub fn pages(&self) -> impl Iterator<Item = Result<PageImage, Pdf2ImgError>> + '_ + use<'_, 'a> {
        (0..self.page_count()).map(move |idx| {
            let img = self.render_image(idx)?;
            let image = encode::encode_image(&img, self.config.output_format, self.config.quality)?;
            Ok(PageImage {
                page: u32::from(idx) + 1,
                image,
            })
        })
    }

    /// Pixel size the 0-indexed page `idx` renders to, without rendering it.
    pub fn page_size(&self, idx: u16) -> Result<(u32, u32), Pdf2ImgError> {
        let page = self.document.pages().get(idx).map_err(page_failed(idx))?;
        let (width, height) = self.target_size(&page);
        Ok((width as u32, height as u32))
    }

    /// Render the 0-indexed page `idx` to pixels.
    pub fn render_image(&self, idx: u16) -> Result<DynamicImage, Pdf2ImgError> {
        let page_num = u32::from(idx) + 1;
        let failed = page_failed(idx);

        let page = self.document.pages().get(idx).map_err(&failed)?;
        let (width, height) = self.target_size(&page);

        let render_config = PdfRenderConfig::new().set_target_size(width, height);
        let bitmap = page.render_with_config(&render_config).map_err(failed)?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn target_size(&self, page: &PdfPage) -> (i32, i32) {
        let scale = self.dpi as f32 / POINTS_PER_INCH;
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;
        (width, height)
    }
}

fn page_failed(idx: u16) -> impl Fn(PdfiumError) -> Pdf2ImgError {
    move |e| Pdf2ImgError::RasterisationFailed {
        page: u32::from(idx) + 1,
        detail: format!("{:?}", e),
    }
}

/// Bind pdfium from, in order: the configured path, `PDFIUM_LIB_PATH`, the
/// system library search path. A directory is searched for the platform's
/// library file name.
fn bind(explicit: Option<&Path>) -> Result<Box<dyn PdfiumLibraryBindings>, Pdf2ImgError> {
    let from_env = std::env::var_os("PDFIUM_LIB_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib).map_err(|e| {
                Pdf2ImgError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e))
            })
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(format!("system library: {:?}", e))),
    }
}
