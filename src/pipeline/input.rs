//! Input resolution: normalise a caller-supplied PDF into something an
//! engine can open.
//!
//! The process engine needs a real file-system path for the rasterizer.
//! In-memory PDFs are written into the per-call working directory first, so
//! they share that directory's lifetime. Every input is checked for the
//! `%PDF` magic bytes before an engine sees it, so callers get a meaningful
//! error rather than a rasterizer crash.

use crate::error::Pdf2ImgError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF to convert.
#[derive(Debug, Clone)]
pub enum PdfInput {
    /// A PDF file on disk.
    Path(PathBuf),
    /// PDF bytes held in memory.
    Bytes(Vec<u8>),
}

impl PdfInput {
    /// Drain a reader into an in-memory input.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, Pdf2ImgError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Pdf2ImgError::io("<reader>", e))?;
        Ok(PdfInput::Bytes(bytes))
    }

    /// Human-readable origin for log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            PdfInput::Path(p) => p.display().to_string(),
            PdfInput::Bytes(b) => format!("<{} bytes in memory>", b.len()),
        }
    }

    /// Check the input looks like a PDF without consuming it.
    pub fn validate(&self) -> Result<(), Pdf2ImgError> {
        match self {
            PdfInput::Path(p) => resolve_local(p).map(|_| ()),
            PdfInput::Bytes(b) => check_magic(Path::new("<memory>"), b),
        }
    }

    /// Resolve to a file on disk, writing in-memory bytes to
    /// `scratch_dir/input.pdf` when needed.
    pub fn materialize(&self, scratch_dir: &Path) -> Result<PathBuf, Pdf2ImgError> {
        match self {
            PdfInput::Path(p) => resolve_local(p),
            PdfInput::Bytes(b) => {
                let path = scratch_dir.join("input.pdf");
                check_magic(&path, b)?;
                std::fs::write(&path, b).map_err(|e| Pdf2ImgError::io(&path, e))?;
                debug!("Wrote {} PDF bytes to {}", b.len(), path.display());
                Ok(path)
            }
        }
    }
}

impl From<PathBuf> for PdfInput {
    fn from(path: PathBuf) -> Self {
        PdfInput::Path(path)
    }
}

impl From<&Path> for PdfInput {
    fn from(path: &Path) -> Self {
        PdfInput::Path(path.to_path_buf())
    }
}

impl From<&str> for PdfInput {
    fn from(path: &str) -> Self {
        PdfInput::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for PdfInput {
    fn from(bytes: Vec<u8>) -> Self {
        PdfInput::Bytes(bytes)
    }
}

/// Resolve a local file path, validating it is a readable regular file
/// starting with the PDF magic bytes.
fn resolve_local(path: &Path) -> Result<PathBuf, Pdf2ImgError> {
    if !path.is_file() {
        return Err(Pdf2ImgError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut f = std::fs::File::open(path).map_err(|e| Pdf2ImgError::io(path, e))?;
    let mut magic = [0u8; 4];
    let n = read_prefix(&mut f, &mut magic).map_err(|e| Pdf2ImgError::io(path, e))?;
    check_magic(path, &magic[..n])?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn check_magic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(Pdf2ImgError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}
