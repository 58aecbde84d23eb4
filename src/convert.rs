//! The conversion strategy: one classified PDF in, one Word document out.
//!
//! [`Converter`] owns the two engines and the configuration. Its
//! [`Converter::convert`] never returns an error: whatever goes wrong is
//! folded into a [`Failure`] inside the returned [`ConversionOutcome`], which
//! is what lets the batch orchestrator keep going after a bad document.
//!
//! Path selection follows the classification:
//!
//! * encrypted → `Failure(EncryptedDocument)`; neither engine is touched
//! * text layer → structural: text runs are reflowed into paragraphs and
//!   tables, embedded images are copied, the page range is honoured
//! * no text → OCR: every page is rasterised and recognised, one paragraph
//!   per page; a requested page range is ignored and the result always
//!   covers the whole document

use crate::backend::{PdfBackend, RasterOptions, TextRecognizer};
use crate::classify;
use crate::config::{ConversionConfig, PageRange};
use crate::error::{ConvertError, Failure};
use crate::output::{
    Classification, ConversionOutcome, ConversionPath, ConvertedDocument, DocumentInfo,
    InspectReport, SourceDocument,
};
use crate::pipeline::layout::{self, Block, LayoutOptions};
use crate::pipeline::ocr::TesseractRecognizer;
use crate::pipeline::render::PdfiumBackend;
use crate::pipeline::{docx, input, postprocess};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Classifies and converts documents with a fixed pair of engines.
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request.
pub struct Converter {
    config: ConversionConfig,
    backend: Arc<dyn PdfBackend>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl Converter {
    /// A converter backed by pdfium and the tesseract executable.
    pub fn new(config: ConversionConfig) -> Self {
        let backend = Arc::new(PdfiumBackend::new(config.pdfium_library_path.clone()));
        let recognizer = Arc::new(TesseractRecognizer::new(
            config.tesseract_command.clone(),
            config.ocr_language.clone(),
        ));
        Self::with_engines(config, backend, recognizer)
    }

    /// A converter with caller-supplied engines.
    pub fn with_engines(
        config: ConversionConfig,
        backend: Arc<dyn PdfBackend>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            config,
            backend,
            recognizer,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Read page count, encryption and metadata.
    pub async fn inspect(&self, pdf: &Path) -> Result<DocumentInfo, ConvertError> {
        let backend = Arc::clone(&self.backend);
        let path = pdf.to_path_buf();
        blocking("inspect", move || backend.inspect(&path)).await
    }

    /// Decide whether the document is encrypted and whether it has text.
    pub async fn classify(&self, pdf: &Path) -> Result<Classification, ConvertError> {
        let backend = Arc::clone(&self.backend);
        let path = pdf.to_path_buf();
        blocking("classify", move || classify::classify(backend.as_ref(), &path)).await
    }

    /// Convert a classified PDF, writing the Word document to `output`.
    ///
    /// `pages` applies to the structural path only.
    pub async fn convert(
        &self,
        pdf: &Path,
        classification: &Classification,
        pages: Option<PageRange>,
        output: &Path,
    ) -> ConversionOutcome {
        let started = Instant::now();
        match self.try_convert(pdf, classification, pages, output).await {
            Ok(doc) => {
                info!(
                    "Converted {} via {:?} (pages {}) in {}ms",
                    pdf.display(),
                    doc.path,
                    doc.page_range,
                    started.elapsed().as_millis()
                );
                ConversionOutcome::Success(doc)
            }
            Err(e) => {
                warn!("Conversion of {} failed: {}", pdf.display(), e);
                ConversionOutcome::Failure(Failure::from(e))
            }
        }
    }

    async fn try_convert(
        &self,
        pdf: &Path,
        classification: &Classification,
        pages: Option<PageRange>,
        output: &Path,
    ) -> Result<ConvertedDocument, ConvertError> {
        let total = classification.page_count;
        match classification.planned_path() {
            None => Err(ConvertError::Encrypted {
                path: pdf.to_path_buf(),
            }),

            Some(ConversionPath::Structural) => {
                let range = pages.unwrap_or(PageRange::full(total));
                let indices = range.validate(total)?;
                debug!("Structural conversion of pages {}", range);

                let backend = Arc::clone(&self.backend);
                let options = StructuralOptions {
                    detect_tables: self.config.detect_tables,
                    extract_images: self.config.extract_images,
                };
                let (path, out) = (pdf.to_path_buf(), output.to_path_buf());
                blocking("structural conversion", move || {
                    convert_structural(backend.as_ref(), &path, &indices, options, &out)
                })
                .await?;

                Ok(ConvertedDocument {
                    output_path: output.to_path_buf(),
                    page_range: range,
                    path: ConversionPath::Structural,
                })
            }

            Some(ConversionPath::Ocr) => {
                if let Some(range) = pages {
                    debug!("Page range {} ignored: OCR converts the whole document", range);
                }

                let backend = Arc::clone(&self.backend);
                let recognizer = Arc::clone(&self.recognizer);
                let raster = RasterOptions {
                    dpi: self.config.dpi,
                    max_pixels: self.config.max_rendered_pixels,
                };
                let (path, out) = (pdf.to_path_buf(), output.to_path_buf());
                blocking("OCR conversion", move || {
                    convert_ocr(backend.as_ref(), recognizer.as_ref(), &path, raster, &out)
                })
                .await?;

                Ok(ConvertedDocument {
                    output_path: output.to_path_buf(),
                    page_range: PageRange::full(total),
                    path: ConversionPath::Ocr,
                })
            }
        }
    }

    /// Convert one document and move the result to `output`.
    ///
    /// Uses atomic write (temp file + rename) so `output` is either the
    /// complete document or untouched.
    pub async fn convert_to_file(
        &self,
        doc: SourceDocument,
        pages: Option<PageRange>,
        output: &Path,
    ) -> Result<ConvertedDocument, Failure> {
        let result = self.run_document(doc, pages).await;
        let report = result
            .single()
            .ok_or_else(|| Failure::from(ConvertError::Internal("no report produced".into())))?;
        let converted = match &report.outcome {
            ConversionOutcome::Success(converted) => converted.clone(),
            ConversionOutcome::Failure(failure) => return Err(failure.clone()),
        };

        persist(&converted.output_path, output)
            .await
            .map_err(Failure::from)?;

        Ok(ConvertedDocument {
            output_path: output.to_path_buf(),
            ..converted
        })
    }

    /// Stage a document just long enough to read its metadata and classify it.
    pub async fn inspect_document(&self, doc: &SourceDocument) -> Result<InspectReport, ConvertError> {
        let workspace = tempfile::tempdir().map_err(|e| ConvertError::io(std::env::temp_dir(), e))?;
        let staged = input::stage_document(doc, workspace.path())?;

        let info = self.inspect(staged.path()).await?;
        let classification = self.classify(staged.path()).await?;
        staged.release()?;

        Ok(InspectReport {
            name: doc.name.clone(),
            info,
            planned_path: classification.planned_path(),
            classification,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct StructuralOptions {
    detect_tables: bool,
    extract_images: bool,
}

/// Run a blocking engine call off the async worker threads.
async fn blocking<T, F>(what: &'static str, f: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConvertError::Internal(format!("{what} task panicked: {e}")))?
}

fn convert_structural(
    backend: &dyn PdfBackend,
    pdf: &Path,
    indices: &[usize],
    options: StructuralOptions,
    output: &Path,
) -> Result<(), ConvertError> {
    let pages = backend.extract_pages(pdf, indices, options.extract_images)?;
    let layout_options = LayoutOptions {
        detect_tables: options.detect_tables,
    };
    let blocks: Vec<Vec<Block>> = pages
        .into_iter()
        .map(|page| layout::layout_page(page, layout_options))
        .collect();
    docx::write_structured(&blocks, output)
}

fn convert_ocr(
    backend: &dyn PdfBackend,
    recognizer: &dyn TextRecognizer,
    pdf: &Path,
    raster: RasterOptions,
    output: &Path,
) -> Result<(), ConvertError> {
    let parent = pdf
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    let scratch = tempfile::Builder::new()
        .prefix("ocr-")
        .tempdir_in(&parent)
        .map_err(|e| ConvertError::io(&parent, e))?;

    let rendered = backend.rasterize_pages(pdf, &raster, scratch.path())?;
    let mut texts = Vec::with_capacity(rendered.len());
    for page in &rendered {
        let text = recognizer.recognize(page)?;
        texts.push(postprocess::clean_text(&text));
    }
    docx::write_plain(&texts, output)?;

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!("Could not remove {}: {}", scratch_path.display(), e);
    }
    Ok(())
}

/// Copy `from` to `to` through a sibling temp file.
async fn persist(from: &Path, to: &Path) -> Result<(), ConvertError> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::io(parent, e))?;
    }
    let tmp: PathBuf = to.with_extension("docx.tmp");
    tokio::fs::copy(from, &tmp)
        .await
        .map_err(|e| ConvertError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, to)
        .await
        .map_err(|e| ConvertError::io(to, e))
}
