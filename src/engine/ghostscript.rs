//! Process-based engine: Ghostscript renders JPEG files into a fresh,
//! randomly named directory under the configured working root.
//!
//! ```text
//! PdfInput ─▶ workdir/pdf2jpg_XXXX ─▶ gs -o %04d.jpg ─▶ collect ─▶ RenderedPages
//!                                                        └─▶ compose ─▶ ImageDescriptor
//! ```
//!
//! Directories are never reused. `as_one_per_page` leaves its directory in
//! place because the returned streams are files inside it; see
//! [`RenderedPages::cleanup`]. `as_one` removes it once the composite has
//! been written to its own temporary stream.

use crate::config::{GhostscriptConfig, OutputFormat, SizeClass};
use crate::descriptor::{remove_workdir, ImageDescriptor, PageImage, RenderedPages};
use crate::engine::PdfImage;
use crate::error::Pdf2ImgError;
use crate::pipeline::collect;
use crate::pipeline::composite;
use crate::pipeline::input::PdfInput;
use crate::pipeline::invoke::RasterizerCommand;
use crate::pipeline::probe::DimensionProber;
use crate::pipeline::shell::OutputPattern;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const WORKDIR_PREFIX: &str = "pdf2jpg_";
const PAGE_EXTENSION: &str = "jpg";
const PAGE_MIME: &str = "image/jpeg";

/// Ghostscript-backed [`PdfImage`].
#[derive(Debug, Clone)]
pub struct GhostscriptPdfImage {
    config: GhostscriptConfig,
    prober: DimensionProber,
}

impl GhostscriptPdfImage {
    /// Validate the configuration and the JPEG decoding capability.
    pub fn new(config: GhostscriptConfig) -> Result<Self, Pdf2ImgError> {
        let config = revalidate(config)?;
        let prober = DimensionProber::new(ImageFormat::Jpeg)?;
        info!(
            "Ghostscript engine: {} (workdir {})",
            config.executable.display(),
            config.workdir.display()
        );
        Ok(Self { config, prober })
    }

    pub fn config(&self) -> &GhostscriptConfig {
        &self.config
    }

    fn create_workdir(&self) -> Result<PathBuf, Pdf2ImgError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .rand_bytes(16)
            .tempdir_in(&self.config.workdir)
            .map_err(|e| Pdf2ImgError::io(&self.config.workdir, e))?;
        Ok(dir.keep())
    }

    fn render_into(
        &self,
        dir: &Path,
        pdf: &PdfInput,
        dpi: u32,
    ) -> Result<Vec<PageImage>, Pdf2ImgError> {
        let input = pdf.materialize(dir)?;
        let pattern = OutputPattern::new(dir, PAGE_EXTENSION);
        let command = RasterizerCommand::ghostscript(&self.config, &input, pattern, dpi)?;
        command.run(self.config.launch)?;

        let output = command.output();
        let pages = collect::collect(output, &self.prober, PAGE_MIME)?;
        if pages.is_empty() {
            return Err(Pdf2ImgError::NoPagesRendered {
                dir: output.dir().to_path_buf(),
                extension: output.extension().to_string(),
            });
        }
        Ok(pages)
    }
}

impl PdfImage for GhostscriptPdfImage {
    fn as_one_per_page(
        &self,
        pdf: &PdfInput,
        size: SizeClass,
    ) -> Result<RenderedPages, Pdf2ImgError> {
        let dpi = self.config.dpi.dpi(size);
        pdf.validate()?;

        let dir = self.create_workdir()?;
        match self.render_into(&dir, pdf, dpi) {
            Ok(pages) => {
                info!(
                    "Rendered {} pages of {} at {} DPI into {}",
                    pages.len(),
                    pdf.describe(),
                    dpi,
                    dir.display()
                );
                Ok(RenderedPages::new(pages, Some(dir)))
            }
            Err(e) => {
                discard_workdir(&dir);
                Err(e)
            }
        }
    }

    fn as_one(&self, pdf: &PdfInput, size: SizeClass) -> Result<ImageDescriptor, Pdf2ImgError> {
        let pages = self.as_one_per_page(pdf, size)?;
        let dir = pages.workdir().map(Path::to_path_buf);

        let result = composite::compose(
            pages.into_images(),
            OutputFormat::JPEG,
            self.config.jpeg_quality,
            self.config.composite_inset,
        );
        if let Some(dir) = dir {
            discard_workdir(&dir);
        }
        result
    }

    fn name(&self) -> &'static str {
        "ghostscript"
    }
}

/// The builder already validated, but a config can also be built by hand.
fn revalidate(config: GhostscriptConfig) -> Result<GhostscriptConfig, Pdf2ImgError> {
    let GhostscriptConfig {
        executable,
        workdir,
        dpi,
        jpeg_quality,
        paper_size,
        composite_inset,
        launch,
    } = config;
    GhostscriptConfig::builder(executable, workdir)
        .dpi(dpi)
        .jpeg_quality(jpeg_quality)
        .paper_size(paper_size)
        .composite_inset(composite_inset)
        .launch(launch)
        .build()
}

fn discard_workdir(dir: &Path) {
    if let Err(e) = remove_workdir(dir) {
        warn!("Failed to remove work directory: {}", e);
    }
}
