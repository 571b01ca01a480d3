//! Dimension probing for rasterizer output.
//!
//! Two tiers, both assuming the format the rasterizer was asked to write:
//!
//! 1. header only: [`image::ImageReader::into_dimensions`] parses the
//!    frame header and stops, no pixel data is decoded;
//! 2. full decode: the whole image is decoded and measured. Used when the
//!    header tier is unavailable or yields an unusable (zero) size.
//!
//! A prober for a format with no compiled-in decoder cannot be built at
//! all, so the missing capability surfaces once at engine construction
//! rather than once per file.

use crate::error::Pdf2ImgError;
use image::{ImageFormat, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct DimensionProber {
    format: ImageFormat,
    header_tier: bool,
}

impl DimensionProber {
    pub fn new(format: ImageFormat) -> Result<Self, Pdf2ImgError> {
        if !format.reading_enabled() {
            return Err(Pdf2ImgError::NoDecoder {
                format: format!("{format:?}"),
            });
        }
        Ok(Self {
            format,
            header_tier: true,
        })
    }

    /// Skip the header tier and always decode fully.
    #[cfg(test)]
    fn full_decode_only(mut self) -> Self {
        self.header_tier = false;
        self
    }

    /// Width and height of the image at `path`.
    pub fn probe(&self, path: &Path) -> Result<(u32, u32), Pdf2ImgError> {
        if self.header_tier {
            match self.header_dimensions(path) {
                Ok((w, h)) if w > 0 && h > 0 => return Ok((w, h)),
                Ok((w, h)) => debug!(
                    "Header of {} reports {}x{}, decoding fully",
                    path.display(),
                    w,
                    h
                ),
                Err(e) => warn!(
                    "Header probe failed for {}: {}, decoding fully",
                    path.display(),
                    e
                ),
            }
        }
        self.decoded_dimensions(path)
    }

    fn reader(&self, path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, Pdf2ImgError> {
        let mut reader = ImageReader::open(path).map_err(|e| Pdf2ImgError::io(path, e))?;
        reader.set_format(self.format);
        Ok(reader)
    }

    fn header_dimensions(&self, path: &Path) -> Result<(u32, u32), Pdf2ImgError> {
        self.reader(path)?
            .into_dimensions()
            .map_err(|e| unsupported(path, e))
    }

    fn decoded_dimensions(&self, path: &Path) -> Result<(u32, u32), Pdf2ImgError> {
        let img = self.reader(path)?.decode().map_err(|e| unsupported(path, e))?;
        let (w, h) = (img.width(), img.height());
        if w == 0 || h == 0 {
            return Err(Pdf2ImgError::UnsupportedImage {
                path: path.to_path_buf(),
                detail: format!("decoded to an empty {w}x{h} image"),
            });
        }
        Ok((w, h))
    }
}

fn unsupported(path: &Path, e: image::ImageError) -> Pdf2ImgError {
    Pdf2ImgError::UnsupportedImage {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}
