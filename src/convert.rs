//! Async entry points.
//!
//! Both engines block: Ghostscript waits on a child process and pdfium is
//! CPU-bound and not async-safe. These wrappers move the call onto tokio's
//! blocking pool so async callers don't stall a worker thread.

use crate::config::SizeClass;
use crate::descriptor::{ImageDescriptor, RenderedPages};
use crate::engine::PdfImage;
use crate::error::Pdf2ImgError;
use crate::pipeline::input::PdfInput;
use std::sync::Arc;

/// [`PdfImage::as_one_per_page`] on the blocking thread pool.
pub async fn as_one_per_page_async<E>(
    engine: Arc<E>,
    pdf: PdfInput,
    size: SizeClass,
) -> Result<RenderedPages, Pdf2ImgError>
where
    E: PdfImage + ?Sized + 'static,
{
    tokio::task::spawn_blocking(move || engine.as_one_per_page(&pdf, size))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
}

/// [`PdfImage::as_one`] on the blocking thread pool.
pub async fn as_one_async<E>(
    engine: Arc<E>,
    pdf: PdfInput,
    size: SizeClass,
) -> Result<ImageDescriptor, Pdf2ImgError>
where
    E: PdfImage + ?Sized + 'static,
{
    tokio::task::spawn_blocking(move || engine.as_one(&pdf, size))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Compose task panicked: {}", e)))?
}
