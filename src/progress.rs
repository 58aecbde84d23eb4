//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each document starts and finishes. Callers forward the events to a
//! terminal progress bar, a log line or a WebSocket; the orchestrator knows
//! nothing about how they are displayed.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2docx::{BatchProgressCallback, ConversionConfig, DocumentReport};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, report: &DocumentReport) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index + 1, total, report.name);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::DocumentReport;
use std::sync::Arc;

/// Called by the batch orchestrator around each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1` the document events may
/// arrive from different threads, so implementations must synchronise any
/// shared mutable state.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document is staged.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is staged and classified.
    ///
    /// `index` is the 0-based position of the document in the input.
    fn on_document_start(&self, index: usize, total_documents: usize, name: &str) {
        let _ = (index, total_documents, name);
    }

    /// Called once the document's outcome is final and its staging
    /// directory has been removed.
    fn on_document_complete(&self, index: usize, total_documents: usize, report: &DocumentReport) {
        let _ = (index, total_documents, report);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, succeeded: usize) {
        let _ = (total_documents, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;
    use crate::output::ConversionOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        batch_total: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.batch_total.store(total, Ordering::SeqCst);
        }

        fn on_document_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _index: usize, _total: usize, _report: &DocumentReport) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    fn failed_report(name: &str) -> DocumentReport {
        DocumentReport {
            name: name.to_string(),
            output_name: name.replace(".pdf", ".docx"),
            outcome: ConversionOutcome::Failure(Failure::encrypted()),
            duration_ms: 0,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(0, 2, "a.pdf");
        cb.on_document_complete(0, 2, &failed_report("a.pdf"));
        cb.on_batch_complete(2, 0);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_batch_start(2);
        for (i, name) in ["a.pdf", "b.pdf"].iter().enumerate() {
            tracker.on_document_start(i, 2, name);
            tracker.on_document_complete(i, 2, &failed_report(name));
        }
        tracker.on_batch_complete(2, 0);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 0);
    }
}
