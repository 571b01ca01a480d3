//! Output collection: turn the rasterizer's numbered files into pages.
//!
//! The rasterizer names its files `<page>.<ext>` (zero-padded). Directory
//! listing order is arbitrary, so pages are sorted numerically; gaps in the
//! numbering are tolerated.

use crate::descriptor::{ImageDescriptor, PageImage};
use crate::error::Pdf2ImgError;
use crate::pipeline::probe::DimensionProber;
use crate::pipeline::shell::OutputPattern;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Regular files in `dir` (no recursion) with exactly `extension`, keyed by
/// page number and sorted ascending.
pub fn list_pages(dir: &Path, extension: &str) -> Result<Vec<(u32, PathBuf)>, Pdf2ImgError> {
    let entries = std::fs::read_dir(dir).map_err(|e| Pdf2ImgError::io(dir, e))?;

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Pdf2ImgError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Pdf2ImgError::io(entry.path(), e))?;
        let path = entry.path();
        if !file_type.is_file() || path.extension() != Some(OsStr::new(extension)) {
            continue;
        }
        let page = page_number(&path).ok_or_else(|| Pdf2ImgError::UnexpectedOutput {
            path: path.clone(),
        })?;
        pages.push((page, path));
    }

    pages.sort_by_key(|(page, _)| *page);
    if let Some(w) = pages.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(Pdf2ImgError::UnexpectedOutput {
            path: w[1].1.clone(),
        });
    }
    Ok(pages)
}

/// Open every page file, sized by `prober`, as an [`ImageDescriptor`].
///
/// The returned streams are owned by the caller; the files stay on disk.
pub fn collect(
    output: &OutputPattern,
    prober: &DimensionProber,
    mime_type: &str,
) -> Result<Vec<PageImage>, Pdf2ImgError> {
    let (dir, extension) = (output.dir(), output.extension());
    let listed = list_pages(dir, extension)?;
    debug!("Collected {} '{}' files from {}", listed.len(), extension, dir.display());

    listed
        .into_iter()
        .map(|(page, path)| {
            let (width, height) = prober.probe(&path)?;
            let file = File::open(&path).map_err(|e| Pdf2ImgError::io(&path, e))?;
            Ok(PageImage {
                page,
                image: ImageDescriptor::new(file, width, height, mime_type),
            })
        })
        .collect()
}

fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse::<u32>().ok().filter(|&n| n > 0)
}
