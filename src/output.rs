//! Value types flowing through the classifier, the conversion strategy and
//! the batch orchestrator.

use crate::config::PageRange;
use crate::error::Failure;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An uploaded PDF: raw bytes plus the name the user knows it by.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name of the Word document this upload converts to.
    pub fn output_name(&self) -> String {
        output_name(&self.name)
    }
}

/// Classifier verdict for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_encrypted: bool,
    pub has_extractable_text: bool,
    /// Page count reported by the PDF library; may be 0 when encrypted.
    pub page_count: usize,
}

impl Classification {
    /// The path the conversion strategy will take, or None when the
    /// document is rejected outright.
    pub fn planned_path(&self) -> Option<ConversionPath> {
        if self.is_encrypted {
            None
        } else if self.has_extractable_text {
            Some(ConversionPath::Structural)
        } else {
            Some(ConversionPath::Ocr)
        }
    }
}

/// Which of the two conversion paths produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPath {
    /// Text layer reflowed into paragraphs, tables and images.
    Structural,
    /// Pages rasterised and read by the OCR engine.
    Ocr,
}

/// A successfully written Word document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub output_path: PathBuf,
    /// Pages covered by the output (always the whole document on the OCR path).
    pub page_range: PageRange,
    pub path: ConversionPath,
}

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    #[serde(rename = "succeeded")]
    Success(ConvertedDocument),
    #[serde(rename = "failed")]
    Failure(Failure),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success(_))
    }

    pub fn as_success(&self) -> Option<&ConvertedDocument> {
        match self {
            ConversionOutcome::Success(doc) => Some(doc),
            ConversionOutcome::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            ConversionOutcome::Success(_) => None,
            ConversionOutcome::Failure(f) => Some(f),
        }
    }
}

/// Outcome of one document, labelled for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Display name as uploaded.
    pub name: String,
    /// Derived `.docx` name (unique within its batch).
    pub output_name: String,
    pub outcome: ConversionOutcome,
    pub duration_ms: u64,
}

/// The zip bundle produced for multi-document batches.
#[derive(Debug, Clone, Serialize)]
pub struct BatchArchive {
    pub path: PathBuf,
    pub file_name: String,
    /// Entry names in input order.
    pub entries: Vec<String>,
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Everything one batch run produced.
///
/// Owns the batch's temporary workspace: every `output_path` and the archive
/// live inside it and are deleted when the result is dropped.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    /// One report per input document, in input order.
    pub documents: Vec<DocumentReport>,
    pub archive: Option<BatchArchive>,
    /// Set when the archive should have been built but could not be.
    pub archive_error: Option<Failure>,
    pub stats: BatchStats,
    #[serde(skip_serializing)]
    pub(crate) workspace: Option<TempDir>,
}

impl BatchResult {
    /// Directory holding the outputs, if the workspace could be created.
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.as_ref().map(|w| w.path())
    }

    /// The lone outcome of a single-document run.
    pub fn single(&self) -> Option<&DocumentReport> {
        match self.documents.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = (&DocumentReport, &ConvertedDocument)> {
        self.documents
            .iter()
            .filter_map(|r| r.outcome.as_success().map(|d| (r, d)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&DocumentReport, &Failure)> {
        self.documents
            .iter()
            .filter_map(|r| r.outcome.as_failure().map(|f| (r, f)))
    }
}

/// PDF metadata shown by `inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}

/// What `inspect` reports: metadata plus the classifier's verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectReport {
    pub name: String,
    pub info: DocumentInfo,
    pub classification: Classification,
    /// None for encrypted documents.
    pub planned_path: Option<ConversionPath>,
}

// ── Output naming ────────────────────────────────────────────────────────

/// Derive the Word file name for an uploaded PDF name.
///
/// Directory components are dropped and a trailing `.pdf` (any case) is
/// replaced by `.docx`; other names simply gain the extension.
pub fn output_name(display_name: &str) -> String {
    let base = display_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(display_name)
        .trim();
    let stem = match base
        .len()
        .checked_sub(4)
        .and_then(|i| base.get(i..).map(|ext| (i, ext)))
    {
        Some((i, ext)) if ext.eq_ignore_ascii_case(".pdf") => &base[..i],
        _ => base,
    };
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{stem}.docx")
}

/// Derive output names for a whole batch, suffixing duplicates `-2`, `-3`, …
pub fn unique_output_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let candidate = output_name(name);
            if used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            let stem = candidate.trim_end_matches(".docx").to_string();
            (2..)
                .map(|n| format!("{stem}-{n}.docx"))
                .find(|c| used.insert(c.to_lowercase()))
                .unwrap_or(candidate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_replaces_extension() {
        assert_eq!(output_name("report.pdf"), "report.docx");
        assert_eq!(output_name("Report.PDF"), "Report.docx");
        assert_eq!(output_name("notes"), "notes.docx");
        assert_eq!(output_name("a.pdf.pdf"), "a.pdf.docx");
    }

    #[test]
    fn output_name_drops_directories() {
        assert_eq!(output_name("../../etc/passwd.pdf"), "passwd.docx");
        assert_eq!(output_name("C:\\scans\\invoice.pdf"), "invoice.docx");
        assert_eq!(output_name(".pdf"), "document.docx");
        assert_eq!(output_name("résumé"), "résumé.docx");
    }

    #[test]
    fn duplicates_get_suffixes() {
        let names = unique_output_names(["a.pdf", "b.pdf", "a.pdf", "A.pdf"]);
        assert_eq!(names, vec!["a.docx", "b.docx", "a-2.docx", "A-3.docx"]);
        let names = unique_output_names(["a-2.pdf", "a.pdf", "a.pdf"]);
        assert_eq!(names, vec!["a-2.docx", "a.docx", "a-3.docx"]);
    }

    #[test]
    fn planned_path_follows_classification() {
        let c = Classification {
            is_encrypted: false,
            has_extractable_text: true,
            page_count: 3,
        };
        assert_eq!(c.planned_path(), Some(ConversionPath::Structural));
        let c = Classification {
            has_extractable_text: false,
            ..c
        };
        assert_eq!(c.planned_path(), Some(ConversionPath::Ocr));
        let c = Classification {
            is_encrypted: true,
            ..c
        };
        assert_eq!(c.planned_path(), None);
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let outcome = ConversionOutcome::Failure(Failure::encrypted());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "encrypted_document");
    }
}
