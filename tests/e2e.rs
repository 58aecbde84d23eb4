//! End-to-end tests against the real pdfium library (and tesseract, for the
//! OCR case).
//!
//! Fixture PDFs are generated with pdfium itself, so no sample files are
//! needed. The tests are gated behind `E2E_ENABLED` because they need the
//! native library at run time.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture

use edgequake_pdf2docx::{
    ConversionConfig, ConversionPath, Converter, FailureKind, PageRange, SourceDocument,
};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// pdfium is bound per call; keep the tests from binding concurrently.
static PDFIUM: Mutex<()> = Mutex::new(());

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

fn bind() -> Pdfium {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
        }
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .expect("pdfium must be loadable for e2e tests");
    Pdfium::new(bindings)
}

/// A PDF with one line of text per entry of `pages`; `None` is a blank page.
fn make_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let pdfium = bind();
    let mut document = pdfium.create_new_pdf().unwrap();
    let font = document.fonts_mut().helvetica();
    for text in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
        if let Some(text) = text {
            page.objects_mut()
                .create_text_object(
                    PdfPoints::new(72.0),
                    PdfPoints::new(720.0),
                    *text,
                    font,
                    PdfPoints::new(14.0),
                )
                .unwrap();
        }
    }
    document.save_to_bytes().unwrap()
}

fn document_xml(docx: &Path) -> String {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(docx).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[tokio::test]
async fn test_inspect_generated_pdf() {
    e2e_skip_unless_enabled!();
    let _guard = PDFIUM.lock().unwrap_or_else(|e| e.into_inner());

    let bytes = make_pdf(&[Some("First page"), Some("Second page"), None]);
    let converter = Converter::new(ConversionConfig::default());
    let report = converter
        .inspect_document(&SourceDocument::new("three.pdf", bytes))
        .await
        .expect("inspect");

    println!("{}", serde_json::to_string_pretty(&report).unwrap());
    assert_eq!(report.info.page_count, 3);
    assert!(!report.info.is_encrypted);
    assert_eq!(report.planned_path, Some(ConversionPath::Structural));
}

#[tokio::test]
async fn test_structural_conversion_with_range() {
    e2e_skip_unless_enabled!();
    let _guard = PDFIUM.lock().unwrap_or_else(|e| e.into_inner());

    let bytes = make_pdf(&[Some("Alpha page"), Some("Beta page"), Some("Gamma page")]);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("beta.docx");

    let converter = Converter::new(ConversionConfig::default());
    let doc = converter
        .convert_to_file(
            SourceDocument::new("abc.pdf", bytes),
            Some(PageRange::new(2, 2)),
            &target,
        )
        .await
        .expect("structural conversion");

    assert_eq!(doc.path, ConversionPath::Structural);
    let xml = document_xml(&target);
    assert!(xml.contains("Beta page"), "missing page 2 text");
    assert!(!xml.contains("Alpha page"));
    assert!(!xml.contains("Gamma page"));
}

#[tokio::test]
async fn test_out_of_bounds_range_fails() {
    e2e_skip_unless_enabled!();
    let _guard = PDFIUM.lock().unwrap_or_else(|e| e.into_inner());

    let bytes = make_pdf(&[Some("Only page")]);
    let dir = tempfile::tempdir().unwrap();
    let converter = Converter::new(ConversionConfig::default());
    let failure = converter
        .convert_to_file(
            SourceDocument::new("one.pdf", bytes),
            Some(PageRange::new(1, 5)),
            &dir.path().join("out.docx"),
        )
        .await
        .expect_err("range exceeds document");
    assert_eq!(failure.kind, FailureKind::InvalidPageRange);
}

#[tokio::test]
async fn test_garbage_after_magic_is_unreadable() {
    e2e_skip_unless_enabled!();
    let _guard = PDFIUM.lock().unwrap_or_else(|e| e.into_inner());

    let converter = Converter::new(ConversionConfig::default());
    let result = converter
        .run_document(
            SourceDocument::new("broken.pdf", b"%PDF-1.7\nthis is not a pdf".to_vec()),
            None,
        )
        .await;
    let failure = result.single().and_then(|r| r.outcome.as_failure()).unwrap();
    assert_eq!(failure.kind, FailureKind::UnreadableDocument);
}

#[tokio::test]
async fn test_blank_pdf_goes_through_ocr() {
    e2e_skip_unless_enabled!();
    let _guard = PDFIUM.lock().unwrap_or_else(|e| e.into_inner());

    let recognizer = edgequake_pdf2docx::pipeline::ocr::TesseractRecognizer::default();
    if !recognizer.is_available() {
        println!("SKIP: tesseract not installed");
        return;
    }

    let bytes = make_pdf(&[None, None]);
    let converter = Converter::new(ConversionConfig::default());
    let result = converter
        .run_document(SourceDocument::new("blank.pdf", bytes), None)
        .await;
    let doc = result
        .single()
        .and_then(|r| r.outcome.as_success())
        .expect("OCR conversion");
    assert_eq!(doc.path, ConversionPath::Ocr);
    assert_eq!(doc.page_range, PageRange::new(1, 2));
}
