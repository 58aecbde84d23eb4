//! Configuration types for PDF-to-DOCX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The same config value drives the
//! library, the CLI and the HTTP server, so a run can be reproduced by
//! copying one struct.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF-to-DOCX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2docx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .ocr_language("eng+deu")
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI for the OCR path. Range: 72–400. Default: 200.
    ///
    /// Tesseract is tuned for roughly 300 DPI input; 200 keeps memory and
    /// time reasonable while still reading 9 pt body text reliably.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2500.
    ///
    /// Caps either dimension so an oversized page (posters, plans) cannot
    /// exhaust memory at the configured DPI.
    pub max_rendered_pixels: u32,

    /// Tesseract language pack(s), e.g. `eng` or `eng+fra`. Default: `eng`.
    pub ocr_language: String,

    /// Name or path of the tesseract executable. Default: `tesseract`.
    pub tesseract_command: String,

    /// Explicit path to the pdfium shared library.
    ///
    /// If None, `PDFIUM_LIB_PATH` is consulted, then the working directory,
    /// then the system library search path.
    pub pdfium_library_path: Option<PathBuf>,

    /// Number of documents converted at the same time in a batch. Default: 1.
    ///
    /// Reports are always returned in input order regardless of this value.
    pub concurrency: usize,

    /// Reconstruct simple tables from column-aligned lines. Default: true.
    pub detect_tables: bool,

    /// Copy embedded page images into the Word document. Default: true.
    pub extract_images: bool,

    /// Page range for single-document conversions. Default: whole document.
    ///
    /// Batch runs ignore this and always convert whole documents.
    pub pages: Option<PageRange>,

    /// Receives per-document progress events during a batch.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2500,
            ocr_language: "eng".to_string(),
            tesseract_command: "tesseract".to_string(),
            pdfium_library_path: None,
            concurrency: 1,
            detect_tables: true,
            extract_images: true,
            pages: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_command", &self.tesseract_command)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("concurrency", &self.concurrency)
            .field("detect_tables", &self.detect_tables)
            .field("extract_images", &self.extract_images)
            .field("pages", &self.pages)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_command = cmd.into();
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn detect_tables(mut self, v: bool) -> Self {
        self.config.detect_tables = v;
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn pages(mut self, range: PageRange) -> Self {
        self.config.pages = Some(range);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page range ───────────────────────────────────────────────────────────

/// A contiguous range of pages, 1-indexed and inclusive on both ends.
///
/// Construction does not validate against a document; call
/// [`PageRange::validate`] once the page count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The range covering every page of a `total`-page document.
    pub fn full(total: usize) -> Self {
        Self { start: 1, end: total }
    }

    /// Number of pages covered.
    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check `1 ≤ start ≤ end ≤ total` and return the 0-indexed page indices.
    pub fn validate(&self, total: usize) -> Result<Vec<usize>, ConvertError> {
        if self.start < 1 || self.start > self.end || self.end > total {
            return Err(ConvertError::InvalidPageRange {
                start: self.start,
                end: self.end,
                total,
            });
        }
        Ok((self.start - 1..self.end).collect())
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl std::str::FromStr for PageRange {
    type Err = ConvertError;

    /// Parse `"3-15"` or a single page `"5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConvertError::InvalidConfig(format!("Invalid page range '{s}'"));
        match s.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse().map_err(|_| invalid())?;
                let end = end.trim().parse().map_err(|_| invalid())?;
                Ok(PageRange::new(start, end))
            }
            None => {
                let page = s.parse().map_err(|_| invalid())?;
                Ok(PageRange::new(page, page))
            }
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `127.0.0.1`.
    pub host: String,
    /// Port to bind. Default: 8000.
    pub port: u16,
    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_bad_dpi() {
        let err = ConversionConfig::builder().dpi(20).build().unwrap_err();
        assert!(err.to_string().contains("DPI"));
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        assert!(ConversionConfig::builder().concurrency(0).build().is_err());
    }

    #[test]
    fn range_validation() {
        assert_eq!(PageRange::new(1, 5).validate(5).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageRange::new(2, 3).validate(5).unwrap(), vec![1, 2]);
        assert!(PageRange::new(2, 1).validate(5).is_err());
        assert!(PageRange::new(0, 3).validate(5).is_err());
        assert!(PageRange::new(4, 6).validate(5).is_err());
    }

    #[test]
    fn range_parsing() {
        assert_eq!("3-15".parse::<PageRange>().unwrap(), PageRange::new(3, 15));
        assert_eq!(" 7 ".parse::<PageRange>().unwrap(), PageRange::new(7, 7));
        assert!("a-b".parse::<PageRange>().is_err());
    }

    #[test]
    fn range_len() {
        assert_eq!(PageRange::full(5).len(), 5);
        assert_eq!(PageRange::new(2, 1).len(), 0);
        assert!(PageRange::full(0).is_empty());
    }
}
