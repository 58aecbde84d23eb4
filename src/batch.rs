//! Batch orchestration: many uploads in, one report per upload out, plus a
//! zip of the successes when there was more than one upload.
//!
//! Per-document lifecycle:
//!
//! ```text
//! Uploaded ─▶ Staged ─▶ Classified ─┬─▶ Converting ─┬─▶ Succeeded
//!                                   │               └─▶ Failed
//!                                   └─▶ Rejected (encrypted) ─▶ Failed
//! ```
//!
//! Every step can fail; a failure ends that document only. Reports come
//! back in input order whatever `concurrency` is set to.

use crate::config::PageRange;
use crate::convert::Converter;
use crate::error::{ConvertError, Failure};
use crate::output::{
    unique_output_names, BatchArchive, BatchResult, BatchStats, ConversionOutcome,
    DocumentReport, SourceDocument,
};
use crate::pipeline::archive::{self, ARCHIVE_NAME};
use crate::pipeline::input;
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

impl Converter {
    /// Convert every document, whole, and bundle the successes.
    ///
    /// Never fails: per-document problems are reported in
    /// [`BatchResult::documents`], an archive problem in
    /// [`BatchResult::archive_error`].
    pub async fn run_batch(&self, docs: Vec<SourceDocument>) -> BatchResult {
        self.run(docs, None).await
    }

    /// Convert a single document, honouring a page range.
    ///
    /// Falls back to the configured page range when `pages` is None. Never
    /// builds an archive.
    pub async fn run_document(&self, doc: SourceDocument, pages: Option<PageRange>) -> BatchResult {
        self.run(vec![doc], pages.or(self.config().pages)).await
    }

    async fn run(&self, docs: Vec<SourceDocument>, pages: Option<PageRange>) -> BatchResult {
        let started = Instant::now();
        let total = docs.len();
        let noop = NoopProgressCallback;
        let callback: &dyn BatchProgressCallback = match &self.config().progress_callback {
            Some(cb) => cb.as_ref(),
            None => &noop,
        };
        callback.on_batch_start(total);
        info!("Starting batch of {} documents", total);

        let names = unique_output_names(docs.iter().map(|d| d.name.as_str()));

        let workspace = tempfile::Builder::new()
            .prefix("pdf2docx-")
            .tempdir()
            .map_err(|e| ConvertError::io(std::env::temp_dir(), e))
            .and_then(|dir| {
                let out = dir.path().join("out");
                std::fs::create_dir_all(&out)
                    .map(|_| dir)
                    .map_err(|e| ConvertError::io(out, e))
            });

        let (documents, workspace) = match workspace {
            Ok(workspace) => {
                let root = workspace.path();
                let documents: Vec<DocumentReport> = stream::iter(
                    docs.into_iter()
                        .zip(names)
                        .enumerate()
                        .map(|(index, (doc, output_name))| {
                            self.process_document(
                                index, total, doc, output_name, pages, root, callback,
                            )
                        }),
                )
                .buffered(self.config().concurrency.max(1))
                .collect()
                .await;
                (documents, Some(workspace))
            }
            Err(e) => {
                warn!("Could not create batch workspace: {}", e);
                let failure = Failure::from(e);
                let documents = docs
                    .into_iter()
                    .zip(names)
                    .enumerate()
                    .map(|(index, (doc, output_name))| {
                        callback.on_document_start(index, total, &doc.name);
                        let report = DocumentReport {
                            name: doc.name,
                            output_name,
                            outcome: ConversionOutcome::Failure(failure.clone()),
                            duration_ms: 0,
                        };
                        callback.on_document_complete(index, total, &report);
                        report
                    })
                    .collect();
                (documents, None)
            }
        };

        let succeeded = documents.iter().filter(|r| r.outcome.is_success()).count();

        let (archive, archive_error) = match &workspace {
            Some(workspace) if total > 1 && succeeded > 0 => {
                match build_archive(&documents, workspace.path()) {
                    Ok(archive) => (Some(archive), None),
                    Err(e) => {
                        warn!("Could not build archive: {}", e);
                        (None, Some(Failure::from(e)))
                    }
                }
            }
            _ => (None, None),
        };

        let stats = BatchStats {
            total,
            succeeded,
            failed: total - succeeded,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Batch complete: {}/{} succeeded in {}ms",
            succeeded, total, stats.duration_ms
        );
        callback.on_batch_complete(total, succeeded);

        BatchResult {
            documents,
            archive,
            archive_error,
            stats,
            workspace,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_document(
        &self,
        index: usize,
        total: usize,
        doc: SourceDocument,
        output_name: String,
        pages: Option<PageRange>,
        workspace: &Path,
        callback: &dyn BatchProgressCallback,
    ) -> DocumentReport {
        callback.on_document_start(index, total, &doc.name);
        let started = Instant::now();
        let output = workspace.join("out").join(&output_name);

        let outcome = match input::stage_document(&doc, workspace) {
            Err(e) => ConversionOutcome::Failure(Failure::from(e)),
            Ok(staged) => {
                let outcome = match self.classify(staged.path()).await {
                    Ok(classification) => {
                        self.convert(staged.path(), &classification, pages, &output)
                            .await
                    }
                    Err(e) => {
                        warn!("Could not classify '{}': {}", doc.name, e);
                        ConversionOutcome::Failure(Failure::from(e))
                    }
                };
                if let Err(e) = staged.release() {
                    warn!("Could not clean up staging for '{}': {}", doc.name, e);
                }
                outcome
            }
        };

        let report = DocumentReport {
            name: doc.name,
            output_name,
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        callback.on_document_complete(index, total, &report);
        report
    }
}

fn build_archive(documents: &[DocumentReport], workspace: &Path) -> Result<BatchArchive, ConvertError> {
    let entries: Vec<(String, PathBuf)> = documents
        .iter()
        .filter_map(|r| {
            r.outcome
                .as_success()
                .map(|d| (r.output_name.clone(), d.output_path.clone()))
        })
        .collect();

    let path = workspace.join(ARCHIVE_NAME);
    archive::write_archive(&entries, &path)?;
    info!("Archived {} documents into {}", entries.len(), path.display());

    Ok(BatchArchive {
        path,
        file_name: ARCHIVE_NAME.to_string(),
        entries: entries.into_iter().map(|(name, _)| name).collect(),
    })
}
