//! # edgequake-pdf2img
//!
//! Rasterise PDF documents into images: one image per page, or every page
//! stacked top to bottom in a single preview image.
//!
//! ## Engines
//!
//! | Engine | Backing | Page format | Feature |
//! |--------|---------|-------------|---------|
//! | [`GhostscriptPdfImage`] | external `gs` process | JPEG | always |
//! | [`PdfiumPdfImage`] | pdfium shared library | PNG or JPEG | `pdfium` (default) |
//!
//! Both implement [`PdfImage`]; pick one at construction with
//! [`build_engine`] or construct it directly.
//!
//! ## Pipeline Overview (Ghostscript)
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate %PDF magic, write in-memory PDFs to the work dir
//!  ├─ 2. Invoke   gs -sDEVICE=jpeg -r<dpi> -o <dir>/%04d.jpg <pdf>
//!  ├─ 3. Collect  list <n>.jpg, sort by page number, open each file
//!  ├─ 4. Probe    width/height from the JPEG header (full decode fallback)
//!  └─ 5. Compose  (as_one) white canvas, max width × summed height
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{GhostscriptConfig, GhostscriptPdfImage, PdfImage, PdfInput, SizeClass};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GhostscriptConfig::builder("/usr/bin/gs", "/var/tmp").build()?;
//!     let engine = GhostscriptPdfImage::new(config)?;
//!
//!     let pages = engine.as_one_per_page(&PdfInput::from("essay.pdf"), SizeClass::Thumbnail)?;
//!     for page in &pages {
//!         println!("page {}: {}x{} {}", page.page, page.image.width(),
//!             page.image.height(), page.image.mime_type());
//!     }
//!     // The page files live in a per-call directory until cleaned up.
//!     pages.cleanup()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `pdfium` | on     | Enables [`PdfiumPdfImage`] (pulls in `pdfium-render`) |
//!
//! Ghostscript-only users can drop the pdfium dependency:
//! ```toml
//! edgequake-pdf2img = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    DpiMap, GhostscriptConfig, GhostscriptConfigBuilder, LaunchMode, OutputFormat, PdfiumConfig,
    PdfiumConfigBuilder, SizeClass,
};
pub use convert::{as_one_async, as_one_per_page_async};
pub use descriptor::{ImageDescriptor, ImageStream, PageImage, RenderedPages};
pub use engine::{build_engine, EngineConfig, GhostscriptPdfImage, PdfImage};
#[cfg(feature = "pdfium")]
pub use engine::{PdfiumDocument, PdfiumPdfImage};
pub use error::{ErrorCategory, Pdf2ImgError};
pub use pipeline::input::PdfInput;
