//! Composite building: stack page images top to bottom on one canvas.
//!
//! The canvas is as wide as the widest page and as tall as all pages
//! together, filled opaque white. Each page is copied (no blending) at
//! `x = inset` and at the running sum of the heights above it. The inset
//! does not widen the canvas.

use crate::config::OutputFormat;
use crate::descriptor::ImageDescriptor;
use crate::error::Pdf2ImgError;
use crate::pipeline::encode;
use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::BufReader;
use tracing::{debug, info};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Canvas size for pages of the given `(width, height)`: max width, summed height.
pub fn canvas_size(
    sizes: impl IntoIterator<Item = (u32, u32)>,
) -> Result<(u32, u32), Pdf2ImgError> {
    let mut width = 0u32;
    let mut height = 0u64;
    let mut count = 0usize;
    for (w, h) in sizes {
        width = width.max(w);
        height += u64::from(h);
        count += 1;
    }
    if count == 0 {
        return Err(Pdf2ImgError::EmptyDocument);
    }
    let height = u32::try_from(height).map_err(|_| Pdf2ImgError::CompositeTooTall {
        pages: count,
        height,
        limit: u32::MAX,
    })?;
    Ok((width, height))
}

/// A white canvas that pages are painted onto in order.
pub struct Canvas {
    image: RgbImage,
    inset: u32,
    cursor: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, inset: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
            inset,
            cursor: 0,
        }
    }

    /// Size a canvas to fit `sizes` stacked vertically.
    pub fn for_pages(
        sizes: impl IntoIterator<Item = (u32, u32)>,
        inset: u32,
    ) -> Result<Self, Pdf2ImgError> {
        let (width, height) = canvas_size(sizes)?;
        debug!("Composite canvas {}x{} (inset {})", width, height, inset);
        Ok(Self::new(width, height, inset))
    }

    /// Paint `page` below everything painted so far.
    pub fn paint(&mut self, page: &DynamicImage) {
        let rgb = page.to_rgb8();
        imageops::replace(
            &mut self.image,
            &rgb,
            i64::from(self.inset),
            i64::from(self.cursor),
        );
        self.cursor = self.cursor.saturating_add(rgb.height());
    }

    pub fn finish(self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.image)
    }
}

/// Compose encoded pages into one image, re-encoded as `format`.
///
/// Pages are decoded one at a time; each page's stream is closed as soon as
/// it has been painted, on success and on error alike.
pub fn compose(
    pages: Vec<ImageDescriptor>,
    format: OutputFormat,
    quality: u8,
    inset: u32,
) -> Result<ImageDescriptor, Pdf2ImgError> {
    let mut canvas = Canvas::for_pages(pages.iter().map(|p| (p.width(), p.height())), inset)?;
    let count = pages.len();

    for (i, page) in pages.into_iter().enumerate() {
        let decoded = decode_page(page, i + 1)?;
        canvas.paint(&decoded);
    }

    let composite = canvas.finish();
    info!(
        "Composed {} pages into {}x{} {}",
        count,
        composite.width(),
        composite.height(),
        format
    );
    encode::encode_image(&composite, format, quality)
}

fn decode_page(mut page: ImageDescriptor, index: usize) -> Result<DynamicImage, Pdf2ImgError> {
    let format = ImageFormat::from_mime_type(page.mime_type()).ok_or_else(|| {
        Pdf2ImgError::UnsupportedImage {
            path: format!("<page {index}>").into(),
            detail: format!("unknown MIME type '{}'", page.mime_type()),
        }
    })?;
    let (width, height) = (page.width(), page.height());
    let decoded = image::load(BufReader::new(page.stream()), format).map_err(|e| {
        Pdf2ImgError::UnsupportedImage {
            path: format!("<page {index}>").into(),
            detail: e.to_string(),
        }
    })?;
    if (decoded.width(), decoded.height()) != (width, height) {
        return Err(Pdf2ImgError::UnsupportedImage {
            path: format!("<page {index}>").into(),
            detail: format!(
                "decoded to {}x{}, descriptor says {}x{}",
                decoded.width(),
                decoded.height(),
                width,
                height
            ),
        });
    }
    Ok(decoded)
}
