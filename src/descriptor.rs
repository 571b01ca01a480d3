//! Output types shared by every engine.
//!
//! An [`ImageDescriptor`] owns its byte stream. Whoever holds the descriptor
//! owns the open file handle; dropping the descriptor (or the stream taken
//! out of it with [`ImageDescriptor::into_stream`]) closes it.

use crate::error::Pdf2ImgError;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A readable, seekable image byte stream.
pub trait ImageStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ImageStream for T {}

/// An encoded image plus the facts callers need before decoding it.
pub struct ImageDescriptor {
    stream: Box<dyn ImageStream>,
    width: u32,
    height: u32,
    mime_type: String,
}

impl ImageDescriptor {
    pub fn new(
        stream: impl ImageStream + 'static,
        width: u32,
        height: u32,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            stream: Box::new(stream),
            width,
            height,
            mime_type: mime_type.into(),
        }
    }

    /// Borrow the stream for reading. The descriptor keeps ownership.
    pub fn stream(&mut self) -> &mut dyn ImageStream {
        self.stream.as_mut()
    }

    /// Take ownership of the stream; closing it becomes the caller's job.
    pub fn into_stream(self) -> Box<dyn ImageStream> {
        self.stream
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl fmt::Debug for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDescriptor")
            .field("stream", &"<dyn ImageStream>")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// One rendered page: its 1-indexed number and its image.
#[derive(Debug)]
pub struct PageImage {
    pub page: u32,
    pub image: ImageDescriptor,
}

/// The result of `as_one_per_page`: pages sorted by page number.
///
/// For the process engine the page streams are files inside a per-call
/// working directory. The directory is not removed automatically; call
/// [`RenderedPages::cleanup`] once the streams have been consumed, or take
/// the images with [`RenderedPages::into_images`] and remove
/// [`RenderedPages::workdir`] yourself.
#[derive(Debug)]
pub struct RenderedPages {
    pages: Vec<PageImage>,
    workdir: Option<PathBuf>,
}

impl RenderedPages {
    /// Build a page set. Pages are re-sorted by page number.
    pub fn new(mut pages: Vec<PageImage>, workdir: Option<PathBuf>) -> Self {
        pages.sort_by_key(|p| p.page);
        Self { pages, workdir }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page numbers in ascending order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|p| p.page)
    }

    pub fn get(&self, page: u32) -> Option<&ImageDescriptor> {
        self.pages
            .binary_search_by_key(&page, |p| p.page)
            .ok()
            .map(|i| &self.pages[i].image)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageImage> {
        self.pages.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PageImage> {
        self.pages.iter_mut()
    }

    /// The transient directory holding the page files, if any.
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Take just the images, in page order.
    pub fn into_images(self) -> Vec<ImageDescriptor> {
        self.pages.into_iter().map(|p| p.image).collect()
    }

    /// Close every remaining stream, then remove the working directory.
    pub fn cleanup(self) -> Result<(), Pdf2ImgError> {
        let Self { pages, workdir } = self;
        drop(pages);
        if let Some(dir) = workdir {
            remove_workdir(&dir)?;
        }
        Ok(())
    }
}

impl IntoIterator for RenderedPages {
    type Item = PageImage;
    type IntoIter = std::vec::IntoIter<PageImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}

impl<'a> IntoIterator for &'a RenderedPages {
    type Item = &'a PageImage;
    type IntoIter = std::slice::Iter<'a, PageImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

pub(crate) fn remove_workdir(dir: &Path) -> Result<(), Pdf2ImgError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!("Removed work directory {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Pdf2ImgError::io(dir, e)),
    }
}
