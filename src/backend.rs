//! Engine seams: the PDF library and the OCR engine behind two traits.
//!
//! The classifier, the conversion strategy and the batch orchestrator only
//! talk to [`PdfBackend`] and [`TextRecognizer`]. Production code plugs in
//! [`crate::pipeline::render::PdfiumBackend`] and
//! [`crate::pipeline::ocr::TesseractRecognizer`]; tests plug in counting
//! stubs so strategy selection can be verified without pdfium or tesseract
//! installed.
//!
//! Both traits are synchronous. The async entry points in
//! [`crate::convert`] call them from `tokio::task::spawn_blocking`.

use crate::error::ConvertError;
use crate::output::DocumentInfo;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// A run of text on one line, positioned in PDF user space (points, y up).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextRun {
    pub fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }
}

/// An image embedded in a page, re-encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Everything the structural path needs from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// 0-indexed page number.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub runs: Vec<TextRun>,
    pub images: Vec<PageImage>,
}

/// How pages are rasterised for OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub dpi: u32,
    pub max_pixels: u32,
}

/// A page rendered to an image file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 0-indexed page number.
    pub index: usize,
    pub image_path: PathBuf,
}

/// Read-only access to a PDF on disk.
pub trait PdfBackend: Send + Sync {
    /// Open the document and report page count, encryption and metadata.
    ///
    /// A document that cannot be opened without a password is reported as
    /// `Ok` with `is_encrypted = true`, not as an error.
    fn inspect(&self, pdf: &Path) -> Result<DocumentInfo, ConvertError>;

    /// Call `visit` with the extracted text of each page, in page order,
    /// until it returns `ControlFlow::Break`.
    fn visit_page_text(
        &self,
        pdf: &Path,
        visit: &mut dyn FnMut(usize, &str) -> ControlFlow<()>,
    ) -> Result<(), ConvertError>;

    /// Extract positioned text (and optionally images) for the given
    /// 0-indexed pages.
    fn extract_pages(
        &self,
        pdf: &Path,
        page_indices: &[usize],
        with_images: bool,
    ) -> Result<Vec<PageContent>, ConvertError>;

    /// Render every page to a PNG inside `out_dir`, in page order.
    fn rasterize_pages(
        &self,
        pdf: &Path,
        options: &RasterOptions,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>, ConvertError>;
}

/// Optical character recognition over a rendered page.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, page: &RenderedPage) -> Result<String, ConvertError>;
}
