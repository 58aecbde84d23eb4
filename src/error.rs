//! Error types for the edgequake-pdf2docx library.
//!
//! Two distinct types reflect two distinct audiences:
//!
//! * [`ConvertError`]: the detailed error raised *inside* a conversion step
//!   (bad input file, pdfium could not be bound, tesseract missing, disk
//!   full). Internal functions return `Result<_, ConvertError>` and use `?`.
//!
//! * [`Failure`]: the value a document's conversion *ends* with when
//!   something went wrong. Every `ConvertError` is folded into a `Failure` at
//!   the conversion-strategy boundary, so one bad document never escapes as an
//!   error and never aborts a batch. `Failure` is `Clone + Serialize` so it can
//!   be stored in reports, returned from the HTTP API and printed by the CLI.
//!
//! [`FailureKind`] is the coarse taxonomy shared by both: callers that map
//! failures onto HTTP status codes or exit codes match on the kind, not on the
//! free-form reason string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Reason reported for every encrypted document.
pub const ENCRYPTED_REASON: &str = "password-protected PDF not supported";

/// Detailed errors raised while staging, classifying or converting a document.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The bytes are not a PDF (missing `%PDF` magic).
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted. Decryption is never attempted.
    #[error("password-protected PDF not supported")]
    Encrypted { path: PathBuf },

    /// Requested page range does not fit the document.
    #[error("Invalid page range {start}-{end} (document has {total} pages)")]
    InvalidPageRange {
        start: usize,
        end: usize,
        total: usize,
    },

    /// pdfium returned an error while reading or rasterising a page.
    #[error("pdfium failed on page {page}: {detail}")]
    PageFailed { page: usize, detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the binary."
    )]
    PdfiumBindingFailed(String),

    /// The OCR engine is not installed or could not be started.
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// The OCR engine ran but reported an error.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// docx-rs could not serialise the document.
    #[error("Failed to write Word document '{path}': {detail}")]
    DocxWriteFailed { path: PathBuf, detail: String },

    /// The batch archive could not be assembled.
    #[error("Failed to build archive '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Temp-file creation, write, read or delete failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Shorthand for wrapping an `io::Error` together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map this error onto the coarse failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::NotAPdf { .. } | ConvertError::CorruptPdf { .. } => {
                FailureKind::UnreadableDocument
            }
            ConvertError::Encrypted { .. } => FailureKind::EncryptedDocument,
            ConvertError::InvalidPageRange { .. } => FailureKind::InvalidPageRange,
            ConvertError::PageFailed { .. }
            | ConvertError::PdfiumBindingFailed(_)
            | ConvertError::OcrUnavailable(_)
            | ConvertError::OcrFailed { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => FailureKind::ConversionEngineFailure,
            ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::DownloadFailed { .. }
            | ConvertError::DocxWriteFailed { .. }
            | ConvertError::ArchiveFailed { .. }
            | ConvertError::Io { .. } => FailureKind::IoFailure,
        }
    }
}

/// Coarse classification of why a document failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The bytes are not a parseable PDF.
    UnreadableDocument,
    /// The PDF is password protected.
    EncryptedDocument,
    /// The requested page range does not fit the document.
    InvalidPageRange,
    /// pdfium, tesseract or the DOCX writer failed.
    ConversionEngineFailure,
    /// Temporary file write/read/delete failed.
    IoFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::UnreadableDocument => "unreadable document",
            FailureKind::EncryptedDocument => "encrypted document",
            FailureKind::InvalidPageRange => "invalid page range",
            FailureKind::ConversionEngineFailure => "conversion engine failure",
            FailureKind::IoFailure => "I/O failure",
        };
        f.write_str(s)
    }
}

/// Terminal failure of one document.
///
/// Displayed as the bare reason so single-document callers can surface it
/// verbatim (`error: <reason>`).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// The failure every encrypted document ends with.
    pub fn encrypted() -> Self {
        Self::new(FailureKind::EncryptedDocument, ENCRYPTED_REASON)
    }
}

impl From<ConvertError> for Failure {
    fn from(err: ConvertError) -> Self {
        Failure::new(err.kind(), err.to_string())
    }
}

impl From<&ConvertError> for Failure {
    fn from(err: &ConvertError) -> Self {
        Failure::new(err.kind(), err.to_string())
    }
}
