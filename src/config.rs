//! Configuration types for PDF-to-image conversion.
//!
//! Each engine is configured through its own builder, validated once in
//! `build()`. Everything that can be checked without touching a PDF (the
//! executable, the working directory, the DPI table, the output format) is
//! checked there, so a misconfigured engine never gets as far as writing a
//! file or launching a process.

use crate::error::Pdf2ImgError;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ── Size classes ─────────────────────────────────────────────────────────

/// Requested output size. Each engine maps it to a fixed DPI via [`DpiMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// Small preview images. (default)
    #[default]
    Thumbnail,
    /// Full-size page images.
    Normal,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Thumbnail => "thumbnail",
            SizeClass::Normal => "normal",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeClass {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thumbnail" => Ok(SizeClass::Thumbnail),
            "normal" => Ok(SizeClass::Normal),
            _ => Err(Pdf2ImgError::InvalidSize { size: s.to_string() }),
        }
    }
}

/// Resolution (dots per inch) used for each [`SizeClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiMap {
    pub thumbnail: u32,
    pub normal: u32,
}

impl DpiMap {
    /// Ghostscript defaults: 30 DPI thumbnails, 300 DPI pages.
    pub const GHOSTSCRIPT: DpiMap = DpiMap {
        thumbnail: 30,
        normal: 300,
    };

    /// pdfium defaults: 12 DPI thumbnails, 100 DPI pages.
    ///
    /// An A4 page renders to 99×140 and 827×1169 pixels respectively.
    pub const PDFIUM: DpiMap = DpiMap {
        thumbnail: 12,
        normal: 100,
    };

    pub fn dpi(&self, size: SizeClass) -> u32 {
        match size {
            SizeClass::Thumbnail => self.thumbnail,
            SizeClass::Normal => self.normal,
        }
    }

    fn validate(&self) -> Result<(), Pdf2ImgError> {
        for size in [SizeClass::Thumbnail, SizeClass::Normal] {
            if self.dpi(size) == 0 {
                return Err(Pdf2ImgError::InvalidConfig(format!(
                    "DPI for size '{size}' must be positive"
                )));
            }
        }
        Ok(())
    }
}

// ── Output format ────────────────────────────────────────────────────────

/// An image format this crate can encode, validated against the `image`
/// crate's compiled-in encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat(ImageFormat);

impl OutputFormat {
    pub const PNG: OutputFormat = OutputFormat(ImageFormat::Png);
    pub const JPEG: OutputFormat = OutputFormat(ImageFormat::Jpeg);

    /// Resolve a format name such as `"PNG"`, `"jpeg"` or `"jpg"`.
    pub fn from_name(name: &str) -> Result<Self, Pdf2ImgError> {
        let unsupported = || Pdf2ImgError::UnsupportedFormat {
            format: name.to_string(),
            supported: Self::supported_names().join(", "),
        };
        let format = ImageFormat::from_extension(name.trim().to_ascii_lowercase())
            .ok_or_else(unsupported)?;
        if !format.writing_enabled() {
            return Err(unsupported());
        }
        Ok(OutputFormat(format))
    }

    /// Names of every format with an enabled encoder.
    pub fn supported_names() -> Vec<&'static str> {
        ImageFormat::all()
            .filter(|f| f.writing_enabled())
            .filter_map(|f| f.extensions_str().first().copied())
            .collect()
    }

    pub fn image_format(&self) -> ImageFormat {
        self.0
    }

    pub fn mime_type(&self) -> &'static str {
        self.0.to_mime_type()
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::PNG
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

// ── Process launch ───────────────────────────────────────────────────────

/// How the rasterizer process is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Spawn the executable directly with an argument vector. (default)
    #[default]
    Direct,
    /// Run the escaped command line through the host shell
    /// (`sh -c` on Unix, `cmd /C` on Windows).
    Shell,
}

// ── Ghostscript engine ───────────────────────────────────────────────────

/// Configuration for [`crate::GhostscriptPdfImage`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2img::GhostscriptConfig;
///
/// let config = GhostscriptConfig::builder("/usr/bin/gs", "/var/tmp")
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GhostscriptConfig {
    /// Path to the Ghostscript executable. Must be executable.
    pub executable: PathBuf,

    /// Root under which each conversion creates its own randomised directory.
    pub workdir: PathBuf,

    /// DPI per size class. Default: [`DpiMap::GHOSTSCRIPT`].
    pub dpi: DpiMap,

    /// JPEG quality passed as `-dJPEGQ`. Range: 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Ghostscript paper size name, pages are fitted to it. Default: `a4`.
    pub paper_size: String,

    /// Left inset in pixels applied when stacking pages in `as_one`. Default: 0.
    ///
    /// The canvas is not widened by the inset, so a non-zero value crops
    /// the right edge of the widest page.
    pub composite_inset: u32,

    /// Default: [`LaunchMode::Direct`].
    pub launch: LaunchMode,
}

impl GhostscriptConfig {
    /// Create a builder for the given executable and working-directory root.
    pub fn builder(
        executable: impl Into<PathBuf>,
        workdir: impl Into<PathBuf>,
    ) -> GhostscriptConfigBuilder {
        GhostscriptConfigBuilder {
            config: GhostscriptConfig {
                executable: executable.into(),
                workdir: workdir.into(),
                dpi: DpiMap::GHOSTSCRIPT,
                jpeg_quality: 90,
                paper_size: "a4".to_string(),
                composite_inset: 0,
                launch: LaunchMode::default(),
            },
        }
    }
}

/// Builder for [`GhostscriptConfig`].
#[derive(Debug)]
pub struct GhostscriptConfigBuilder {
    config: GhostscriptConfig,
}

impl GhostscriptConfigBuilder {
    pub fn dpi(mut self, dpi: DpiMap) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn paper_size(mut self, name: impl Into<String>) -> Self {
        self.config.paper_size = name.into();
        self
    }

    pub fn composite_inset(mut self, px: u32) -> Self {
        self.config.composite_inset = px;
        self
    }

    pub fn launch(mut self, mode: LaunchMode) -> Self {
        self.config.launch = mode;
        self
    }

    /// Build the configuration, validating the executable, the working
    /// directory and the DPI table.
    pub fn build(self) -> Result<GhostscriptConfig, Pdf2ImgError> {
        let c = &self.config;
        assert_executable(&c.executable)?;
        if !c.workdir.is_dir() {
            return Err(Pdf2ImgError::NotADirectory {
                path: c.workdir.clone(),
            });
        }
        c.dpi.validate()?;
        if c.paper_size.is_empty() || !c.paper_size.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "Paper size must be a Ghostscript paper name, got '{}'",
                c.paper_size
            )));
        }
        Ok(self.config)
    }
}

fn assert_executable(path: &Path) -> Result<(), Pdf2ImgError> {
    let not_executable = || Pdf2ImgError::NotExecutable {
        path: path.to_path_buf(),
    };
    let meta = std::fs::metadata(path).map_err(|_| not_executable())?;
    if !meta.is_file() {
        return Err(not_executable());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(not_executable());
        }
    }
    Ok(())
}

// ── pdfium engine ────────────────────────────────────────────────────────

/// Configuration for the native pdfium engine.
#[derive(Debug, Clone)]
pub struct PdfiumConfig {
    /// Output format for every returned image. Default: PNG.
    pub output_format: OutputFormat,

    /// Encoder quality, 1–100. JPEG uses it directly; PNG maps it onto a
    /// compression level. Default: 20.
    pub quality: u8,

    /// DPI per size class. Default: [`DpiMap::PDFIUM`].
    pub dpi: DpiMap,

    /// Explicit pdfium shared library. Falls back to `PDFIUM_LIB_PATH`,
    /// then to the system library search path.
    pub library_path: Option<PathBuf>,

    /// Left inset in pixels applied when stacking pages in `as_one`. Default: 0.
    pub composite_inset: u32,
}

impl Default for PdfiumConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::PNG,
            quality: 20,
            dpi: DpiMap::PDFIUM,
            library_path: None,
            composite_inset: 0,
        }
    }
}

impl PdfiumConfig {
    pub fn builder() -> PdfiumConfigBuilder {
        PdfiumConfigBuilder {
            config: Self::default(),
            format_name: None,
        }
    }
}

/// Builder for [`PdfiumConfig`].
#[derive(Debug)]
pub struct PdfiumConfigBuilder {
    config: PdfiumConfig,
    format_name: Option<String>,
}

impl PdfiumConfigBuilder {
    /// Output format by name (`"PNG"`, `"JPEG"`, …), checked in `build()`.
    pub fn output_format(mut self, name: impl Into<String>) -> Self {
        self.format_name = Some(name.into());
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn dpi(mut self, dpi: DpiMap) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.library_path = Some(path.into());
        self
    }

    pub fn composite_inset(mut self, px: u32) -> Self {
        self.config.composite_inset = px;
        self
    }

    pub fn build(mut self) -> Result<PdfiumConfig, Pdf2ImgError> {
        if let Some(name) = self.format_name.take() {
            self.config.output_format = OutputFormat::from_name(&name)?;
        }
        self.config.dpi.validate()?;
        Ok(self.config)
    }
}
