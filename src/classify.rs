//! Document classification: is it encrypted, and does it carry text?
//!
//! The verdict picks the conversion path:
//!
//! | encrypted | text layer | path                         |
//! |-----------|------------|------------------------------|
//! | yes       | any        | rejected, never decrypted    |
//! | no        | yes        | structural (layout reflow)   |
//! | no        | no         | OCR                          |
//!
//! A page "has text" when its extracted text is non-empty after trimming
//! whitespace. The scan stops at the first such page, so a long digital
//! document costs one page of extraction. Encrypted documents are never
//! scanned.

use crate::backend::PdfBackend;
use crate::error::ConvertError;
use crate::output::Classification;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

/// Classify the PDF at `pdf`.
///
/// Errors only when the document cannot be opened at all (corrupt or not a
/// PDF) or the PDF library cannot be loaded.
pub fn classify(backend: &dyn PdfBackend, pdf: &Path) -> Result<Classification, ConvertError> {
    let info = backend.inspect(pdf)?;
    if info.is_encrypted {
        debug!("{} is encrypted", pdf.display());
        return Ok(Classification {
            is_encrypted: true,
            has_extractable_text: false,
            page_count: info.page_count,
        });
    }

    let mut first_text_page = None;
    if info.page_count > 0 {
        backend.visit_page_text(pdf, &mut |index, text| {
            if text.trim().is_empty() {
                ControlFlow::Continue(())
            } else {
                first_text_page = Some(index);
                ControlFlow::Break(())
            }
        })?;
    }

    match first_text_page {
        Some(index) => debug!("{}: text found on page {}", pdf.display(), index + 1),
        None => debug!("{}: no text layer", pdf.display()),
    }

    Ok(Classification {
        is_encrypted: false,
        has_extractable_text: first_text_page.is_some(),
        page_count: info.page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{PageContent, RasterOptions, RenderedPage};
    use crate::output::DocumentInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pages described inline; counts how many pages were visited.
    struct Pages {
        texts: Vec<&'static str>,
        encrypted: bool,
        visited: AtomicUsize,
    }

    impl Pages {
        fn new(texts: Vec<&'static str>) -> Self {
            Self {
                texts,
                encrypted: false,
                visited: AtomicUsize::new(0),
            }
        }
    }

    impl PdfBackend for Pages {
        fn inspect(&self, _pdf: &Path) -> Result<DocumentInfo, ConvertError> {
            Ok(DocumentInfo {
                page_count: if self.encrypted { 0 } else { self.texts.len() },
                is_encrypted: self.encrypted,
                ..DocumentInfo::default()
            })
        }

        fn visit_page_text(
            &self,
            _pdf: &Path,
            visit: &mut dyn FnMut(usize, &str) -> ControlFlow<()>,
        ) -> Result<(), ConvertError> {
            for (i, text) in self.texts.iter().enumerate() {
                self.visited.fetch_add(1, Ordering::SeqCst);
                if visit(i, text).is_break() {
                    break;
                }
            }
            Ok(())
        }

        fn extract_pages(
            &self,
            _pdf: &Path,
            _page_indices: &[usize],
            _with_images: bool,
        ) -> Result<Vec<PageContent>, ConvertError> {
            unreachable!("classification never extracts layout")
        }

        fn rasterize_pages(
            &self,
            _pdf: &Path,
            _options: &RasterOptions,
            _out_dir: &Path,
        ) -> Result<Vec<RenderedPage>, ConvertError> {
            unreachable!("classification never rasterises")
        }
    }

    #[test]
    fn stops_at_first_page_with_text() {
        let pages = Pages::new(vec!["", "  \n ", "Hello", "World"]);
        let c = classify(&pages, Path::new("doc.pdf")).unwrap();
        assert!(c.has_extractable_text);
        assert!(!c.is_encrypted);
        assert_eq!(c.page_count, 4);
        assert_eq!(pages.visited.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn whitespace_only_pages_have_no_text() {
        let pages = Pages::new(vec![" ", "\n\t"]);
        let c = classify(&pages, Path::new("scan.pdf")).unwrap();
        assert!(!c.has_extractable_text);
        assert_eq!(pages.visited.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn encrypted_documents_are_not_scanned() {
        let mut pages = Pages::new(vec!["secret"]);
        pages.encrypted = true;
        let c = classify(&pages, Path::new("locked.pdf")).unwrap();
        assert!(c.is_encrypted);
        assert!(!c.has_extractable_text);
        assert_eq!(pages.visited.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_page_document_has_no_text() {
        let pages = Pages::new(vec![]);
        let c = classify(&pages, Path::new("empty.pdf")).unwrap();
        assert_eq!(c.page_count, 0);
        assert!(!c.has_extractable_text);
    }
}
