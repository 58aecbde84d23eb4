//! pdfium access: metadata, text runs, embedded images and page rasters.
//!
//! All functions here block. pdfium keeps thread-local state and is not safe
//! to drive from async code, so the async entry points in
//! [`crate::convert`] call [`PdfiumBackend`] inside
//! `tokio::task::spawn_blocking`.
//!
//! ## Library binding
//!
//! Each call binds pdfium afresh, trying in order:
//!
//! 1. the configured `pdfium_library_path`, else `PDFIUM_LIB_PATH`
//! 2. the platform library name in the working directory
//! 3. the system library search path

use crate::backend::{PageContent, PageImage, PdfBackend, RasterOptions, RenderedPage, TextRun};
use crate::error::ConvertError;
use crate::output::DocumentInfo;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Embedded images smaller than this on either side (icons, rules, bullets)
/// are left out of the Word document.
const MIN_IMAGE_SIDE_PX: u32 = 16;

/// [`PdfBackend`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let library = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                debug!("Binding pdfium from {}", library.display());
                Pdfium::bind_to_library(&library)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

/// Open a document, mapping pdfium's load error onto our taxonomy.
fn open<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ConvertError::Encrypted {
                path: pdf_path.to_path_buf(),
            }
        } else {
            ConvertError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn page_error(index: usize, e: PdfiumError) -> ConvertError {
    ConvertError::PageFailed {
        page: index + 1,
        detail: format!("{:?}", e),
    }
}

impl PdfBackend for PdfiumBackend {
    fn inspect(&self, pdf_path: &Path) -> Result<DocumentInfo, ConvertError> {
        let pdfium = self.bind()?;
        let document = match open(&pdfium, pdf_path) {
            Ok(document) => document,
            Err(ConvertError::Encrypted { .. }) => {
                info!("{} requires a password", pdf_path.display());
                return Ok(DocumentInfo {
                    is_encrypted: true,
                    ..DocumentInfo::default()
                });
            }
            Err(e) => return Err(e),
        };

        // Documents with an empty user password open without one but still
        // carry a security handler.
        let is_encrypted = !matches!(
            document.permissions().security_handler_revision(),
            Ok(PdfSecurityHandlerRevision::Unprotected) | Err(_)
        );

        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().trim().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        let info = DocumentInfo {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: document.pages().len() as usize,
            pdf_version: format!("{:?}", document.version()),
            is_encrypted,
        };
        info!("PDF loaded: {} pages", info.page_count);
        Ok(info)
    }

    fn visit_page_text(
        &self,
        pdf_path: &Path,
        visit: &mut dyn FnMut(usize, &str) -> ControlFlow<()>,
    ) -> Result<(), ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf_path)?;

        for (index, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| page_error(index, e))?.all();
            if visit(index, &text).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn extract_pages(
        &self,
        pdf_path: &Path,
        page_indices: &[usize],
        with_images: bool,
    ) -> Result<Vec<PageContent>, ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf_path)?;
        let pages = document.pages();
        let total_pages = pages.len() as usize;

        let mut results = Vec::with_capacity(page_indices.len());
        for &idx in page_indices {
            if idx >= total_pages {
                warn!(
                    "Skipping page {} (out of range, total={})",
                    idx + 1,
                    total_pages
                );
                continue;
            }

            let page = pages.get(idx as u16).map_err(|e| page_error(idx, e))?;
            let text = page.text().map_err(|e| page_error(idx, e))?;

            let runs: Vec<TextRun> = text
                .segments()
                .iter()
                .map(|segment| {
                    let bounds = segment.bounds();
                    TextRun {
                        text: segment.text(),
                        left: bounds.left().value,
                        right: bounds.right().value,
                        top: bounds.top().value,
                        bottom: bounds.bottom().value,
                    }
                })
                .collect();

            let images = if with_images {
                page_images(&page, idx)
            } else {
                Vec::new()
            };

            debug!(
                "Extracted page {} → {} runs, {} images",
                idx + 1,
                runs.len(),
                images.len()
            );

            results.push(PageContent {
                index: idx,
                width: page.width().value,
                height: page.height().value,
                runs,
                images,
            });
        }

        Ok(results)
    }

    fn rasterize_pages(
        &self,
        pdf_path: &Path,
        options: &RasterOptions,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>, ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf_path)?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(options.dpi as f32 / 72.0)
            .set_maximum_width(options.max_pixels as i32)
            .set_maximum_height(options.max_pixels as i32);

        let mut results = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| page_error(idx, e))?;

            // Tesseract reads greyscale as well as colour and the files are
            // a third of the size.
            let image = DynamicImage::ImageLuma8(bitmap.as_image().to_luma8());
            let path = out_dir.join(format!("page-{:04}.png", idx + 1));
            image
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| ConvertError::PageFailed {
                    page: idx + 1,
                    detail: format!("could not save raster: {e}"),
                })?;

            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            results.push(RenderedPage {
                index: idx,
                image_path: path,
            });
        }

        Ok(results)
    }
}

/// Collect a page's embedded raster images as PNG.
///
/// Images that fail to decode are skipped with a warning; a missing picture
/// is not worth failing the whole document over.
fn page_images(page: &PdfPage, idx: usize) -> Vec<PageImage> {
    let mut images = Vec::new();
    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };
        let raw = match image_object.get_raw_image() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Page {}: skipping unreadable image: {:?}", idx + 1, e);
                continue;
            }
        };
        if raw.width() < MIN_IMAGE_SIDE_PX || raw.height() < MIN_IMAGE_SIDE_PX {
            continue;
        }
        match encode_png(&raw) {
            Ok(png) => images.push(PageImage {
                png,
                width: raw.width(),
                height: raw.height(),
            }),
            Err(e) => warn!("Page {}: skipping image: {}", idx + 1, e),
        }
    }
    images
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
