//! Image encoding: `DynamicImage` → [`ImageDescriptor`] on an anonymous
//! temporary file.
//!
//! The temp file is unlinked as soon as it is created, so the returned
//! stream is the only handle to the bytes and they disappear when it is
//! dropped. The stream is rewound before it is handed back.

use crate::config::OutputFormat;
use crate::descriptor::ImageDescriptor;
use crate::error::Pdf2ImgError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::io::{BufWriter, Seek, Write};
use tracing::debug;

/// Encode `img` as `format` at `quality` (1–100).
///
/// JPEG takes the quality directly. PNG is lossless, so quality selects the
/// compression effort instead: below 34 fast, below 67 default, else best.
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<ImageDescriptor, Pdf2ImgError> {
    let file = tempfile::tempfile().map_err(|e| Pdf2ImgError::io(std::env::temp_dir(), e))?;
    let mut writer = BufWriter::new(file);

    let encoded = match format.image_format() {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Png => {
            let compression = match quality {
                0..=33 => CompressionType::Fast,
                34..=66 => CompressionType::Default,
                _ => CompressionType::Best,
            };
            let encoder = PngEncoder::new_with_quality(&mut writer, compression, FilterType::Adaptive);
            img.write_with_encoder(encoder)
        }
        other => {
            return Err(Pdf2ImgError::UnsupportedFormat {
                format: format!("{other:?}"),
                supported: OutputFormat::supported_names().join(", "),
            })
        }
    };
    encoded.map_err(|e| Pdf2ImgError::EncodeFailed {
        format: format.to_string(),
        detail: e.to_string(),
    })?;

    writer
        .flush()
        .map_err(|e| Pdf2ImgError::io(std::env::temp_dir(), e))?;
    let mut file = writer
        .into_inner()
        .map_err(|e| Pdf2ImgError::io(std::env::temp_dir(), e.into_error()))?;
    file.rewind()
        .map_err(|e| Pdf2ImgError::io(std::env::temp_dir(), e))?;

    debug!(
        "Encoded {}x{} {} image",
        img.width(),
        img.height(),
        format
    );
    Ok(ImageDescriptor::new(
        file,
        img.width(),
        img.height(),
        format.mime_type(),
    ))
}
