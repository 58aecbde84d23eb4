//! # edgequake-pdf2docx
//!
//! Convert PDF documents to Word (`.docx`), one at a time or in batches.
//!
//! ## How a document is converted
//!
//! Every PDF is classified first, and the verdict picks one of two paths:
//!
//! * **Structural**: the PDF has a text layer. Text runs are read with
//!   pdfium and reflowed into paragraphs and simple tables; embedded images
//!   are copied across. A page range may restrict the output.
//! * **OCR**: no page carries text (a scan). Every page is rasterised and
//!   read by tesseract, giving one paragraph of text per page.
//!
//! Password-protected PDFs are rejected; decryption is never attempted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload(s)
//!  │
//!  ├─ 1. Stage     bytes → per-document temp dir, %PDF check
//!  ├─ 2. Classify  encrypted? any page with text?
//!  ├─ 3. Convert   structural (layout reflow) or OCR (tesseract)
//!  ├─ 4. Write     docx-rs → name.docx
//!  └─ 5. Bundle    several uploads → converted_files.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2docx::{ConversionConfig, Converter, SourceDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ConversionConfig::default());
//!     let docs = vec![
//!         SourceDocument::new("report.pdf", std::fs::read("report.pdf")?),
//!         SourceDocument::new("scan.pdf", std::fs::read("scan.pdf")?),
//!     ];
//!     let result = converter.run_batch(docs).await;
//!     for (report, failure) in result.failures() {
//!         eprintln!("{}: {}", report.name, failure);
//!     }
//!     if let Some(archive) = &result.archive {
//!         std::fs::copy(&archive.path, &archive.file_name)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP transport ([`server`]) |
//! | `cli`    | on      | The `pdf2docx` binary (clap + anyhow + indicatif + tracing-subscriber); implies `server` |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-pdf2docx = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! pdfium must be loadable at run time (`PDFIUM_LIB_PATH`, the working
//! directory, or the system library path). The `tesseract` executable is
//! only needed for scanned documents.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod batch;
pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{PdfBackend, TextRecognizer};
pub use config::{ConversionConfig, ConversionConfigBuilder, PageRange, ServerConfig};
pub use convert::Converter;
pub use error::{ConvertError, Failure, FailureKind};
pub use output::{
    BatchArchive, BatchResult, BatchStats, Classification, ConversionOutcome, ConversionPath,
    ConvertedDocument, DocumentInfo, DocumentReport, InspectReport, SourceDocument,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
