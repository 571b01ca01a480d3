//! Error types for the edgequake-pdf2img library.
//!
//! Every failure is fatal for the request that produced it: a conversion
//! either returns all of its pages or an [`Pdf2ImgError`]. There is no
//! partial-result type and no automatic retry of the external rasterizer.
//!
//! Variants are grouped by [`ErrorCategory`] so callers can branch on the
//! kind of failure (bad configuration vs. a tool that exited non-zero vs.
//! an unreadable file) without matching every variant.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Pdf2ImgError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad executable path, bad working directory, invalid size or DPI.
    Configuration,
    /// The rasterizer could not be launched or exited non-zero.
    ExternalTool,
    /// A file or directory could not be read, written or removed.
    Io,
    /// No decoder is available, or a generated file is not a decodable image.
    UnsupportedImage,
    /// The requested output format is not in the engine's capability list.
    UnsupportedFormat,
    /// The native engine could not open or render the PDF.
    Pdf,
    /// Unexpected internal error.
    Internal,
}

/// All errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The rasterizer executable is missing or lacks the execute bit.
    #[error("Rasterizer path '{path}' is not executable")]
    NotExecutable { path: PathBuf },

    /// The configured working directory does not exist or is not a directory.
    #[error("Working directory '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// A size name could not be mapped to a [`crate::SizeClass`].
    #[error("Invalid size given: '{size}' (expected 'thumbnail' or 'normal')")]
    InvalidSize { size: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── External tool errors ──────────────────────────────────────────────
    /// The rasterizer process could not be started.
    #[error("Failed to launch rasterizer: {command}: {source}")]
    ToolLaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The rasterizer ran but reported failure.
    #[error("Rasterizer exited with {status}: {command}{}", stderr_suffix(.stderr))]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The rasterizer reported success but produced no page images.
    #[error("Rasterizer produced no '{extension}' files in '{dir}'")]
    NoPagesRendered { dir: PathBuf, extension: String },

    /// An argument contains a character the host shell cannot quote safely.
    #[error("Argument {arg:?} cannot be escaped for {shell}: contains {ch:?}")]
    UnescapableArgument {
        arg: String,
        shell: &'static str,
        ch: char,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input PDF was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Generic I/O failure on a specific path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A generated file does not follow the `<page>.<ext>` naming contract.
    #[error("Unexpected rasterizer output '{path}': file stem is not a page number")]
    UnexpectedOutput { path: PathBuf },

    // ── Image errors ──────────────────────────────────────────────────────
    /// Neither the header-only nor the full-decode path could size the image.
    #[error("Unsupported image '{path}': {detail}")]
    UnsupportedImage { path: PathBuf, detail: String },

    /// No decoder for the expected format was compiled in.
    #[error("No decoder available for {format}: enable the matching `image` feature")]
    NoDecoder { format: String },

    /// The requested output format cannot be written by this engine.
    #[error("Image format '{format}' is not supported (supported: {supported})")]
    UnsupportedFormat { format: String, supported: String },

    /// Encoding a rendered or composed image failed.
    #[error("Failed to encode {format} image: {detail}")]
    EncodeFailed { format: String, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The native engine could not open the PDF.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The native engine returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: u32, detail: String },

    /// Stacked pages are taller than an image can be.
    #[error("Composite of {pages} pages would be {height} px tall (limit {limit} px)")]
    CompositeTooTall { pages: usize, height: u64, limit: u32 },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// A conversion produced nothing to compose.
    #[error("Document has no pages to compose")]
    EmptyDocument,

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

impl Pdf2ImgError {
    /// Wrap an [`std::io::Error`] together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Pdf2ImgError::Io {
            path: path.into(),
            source,
        }
    }

    /// Which part of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        use Pdf2ImgError::*;
        match self {
            NotExecutable { .. }
            | NotADirectory { .. }
            | InvalidSize { .. }
            | InvalidConfig(_)
            | PdfiumBindingFailed(_) => ErrorCategory::Configuration,
            ToolLaunchFailed { .. }
            | ToolFailed { .. }
            | NoPagesRendered { .. }
            | UnescapableArgument { .. } => ErrorCategory::ExternalTool,
            FileNotFound { .. } | NotAPdf { .. } | Io { .. } | UnexpectedOutput { .. } => {
                ErrorCategory::Io
            }
            UnsupportedImage { .. } | NoDecoder { .. } => ErrorCategory::UnsupportedImage,
            UnsupportedFormat { .. } => ErrorCategory::UnsupportedFormat,
            CorruptPdf { .. }
            | RasterisationFailed { .. }
            | CompositeTooTall { .. }
            | EmptyDocument => ErrorCategory::Pdf,
            EncodeFailed { .. } | Internal(_) => ErrorCategory::Internal,
        }
    }
}
