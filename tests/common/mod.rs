//! Stub engines shared by the integration tests.
//!
//! Fixtures are tiny text files that start with `%PDF` so they pass the
//! magic check, followed by one directive per line:
//!
//! ```text
//! %PDF-1.7 stub
//! pages=3
//! text=1,2       pages (1-based) that carry a text layer
//! encrypted
//! corrupt        inspect fails as if pdfium could not parse the file
//! ```
//!
//! The stubs count every engine call so tests can assert which path ran.

#![allow(dead_code)]

use edgequake_pdf2docx::backend::{
    PageContent, PdfBackend, RasterOptions, RenderedPage, TextRecognizer, TextRun,
};
use edgequake_pdf2docx::{ConversionConfig, ConvertError, Converter, DocumentInfo, SourceDocument};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Calls {
    pub inspect: AtomicUsize,
    pub visit: AtomicUsize,
    pub extract: AtomicUsize,
    pub rasterize: AtomicUsize,
    pub recognize: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn engine_work(&self) -> usize {
        Self::get(&self.extract) + Self::get(&self.rasterize) + Self::get(&self.recognize)
    }
}

#[derive(Debug, Default)]
struct Fixture {
    pages: usize,
    text_pages: BTreeSet<usize>,
    encrypted: bool,
    corrupt: bool,
}

fn read_fixture(pdf: &Path) -> Result<Fixture, ConvertError> {
    let raw = std::fs::read_to_string(pdf).map_err(|e| ConvertError::io(pdf, e))?;
    let mut fixture = Fixture::default();
    for line in raw.lines().map(str::trim) {
        if let Some(n) = line.strip_prefix("pages=") {
            fixture.pages = n.parse().unwrap_or(0);
        } else if let Some(list) = line.strip_prefix("text=") {
            fixture.text_pages = list
                .split(',')
                .filter_map(|p| p.trim().parse::<usize>().ok())
                .collect();
        } else if line == "encrypted" {
            fixture.encrypted = true;
        } else if line == "corrupt" {
            fixture.corrupt = true;
        }
    }
    Ok(fixture)
}

/// A [`PdfBackend`] driven by fixture files.
pub struct StubBackend {
    calls: Arc<Calls>,
}

impl PdfBackend for StubBackend {
    fn inspect(&self, pdf: &Path) -> Result<DocumentInfo, ConvertError> {
        self.calls.inspect.fetch_add(1, Ordering::SeqCst);
        let fixture = read_fixture(pdf)?;
        if fixture.corrupt {
            return Err(ConvertError::CorruptPdf {
                path: pdf.to_path_buf(),
                detail: "stub: unparseable".into(),
            });
        }
        Ok(DocumentInfo {
            title: Some("Stub".into()),
            page_count: fixture.pages,
            pdf_version: "Pdf1_7".into(),
            is_encrypted: fixture.encrypted,
            ..Default::default()
        })
    }

    fn visit_page_text(
        &self,
        pdf: &Path,
        visit: &mut dyn FnMut(usize, &str) -> ControlFlow<()>,
    ) -> Result<(), ConvertError> {
        let fixture = read_fixture(pdf)?;
        for index in 0..fixture.pages {
            self.calls.visit.fetch_add(1, Ordering::SeqCst);
            let text = if fixture.text_pages.contains(&(index + 1)) {
                format!("Page {} text", index + 1)
            } else {
                "  \n ".to_string()
            };
            if visit(index, &text).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn extract_pages(
        &self,
        pdf: &Path,
        page_indices: &[usize],
        _with_images: bool,
    ) -> Result<Vec<PageContent>, ConvertError> {
        self.calls.extract.fetch_add(1, Ordering::SeqCst);
        let fixture = read_fixture(pdf)?;
        Ok(page_indices
            .iter()
            .map(|&index| {
                let runs = if fixture.text_pages.contains(&(index + 1)) {
                    vec![TextRun {
                        text: format!("Page {} text", index + 1),
                        left: 72.0,
                        right: 200.0,
                        top: 720.0,
                        bottom: 708.0,
                    }]
                } else {
                    Vec::new()
                };
                PageContent {
                    index,
                    width: 612.0,
                    height: 792.0,
                    runs,
                    images: Vec::new(),
                }
            })
            .collect())
    }

    fn rasterize_pages(
        &self,
        pdf: &Path,
        _options: &RasterOptions,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>, ConvertError> {
        self.calls.rasterize.fetch_add(1, Ordering::SeqCst);
        let fixture = read_fixture(pdf)?;
        Ok((0..fixture.pages)
            .map(|index| RenderedPage {
                index,
                image_path: out_dir.join(format!("page-{:04}.png", index + 1)),
            })
            .collect())
    }
}

/// A [`TextRecognizer`] that "reads" a fixed line per page.
pub struct StubRecognizer {
    calls: Arc<Calls>,
}

impl TextRecognizer for StubRecognizer {
    fn recognize(&self, page: &RenderedPage) -> Result<String, ConvertError> {
        self.calls.recognize.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Scanned page {}\nsecond line", page.index + 1))
    }
}

/// A converter wired to the stubs, plus the shared call counters.
pub fn stub_converter(config: ConversionConfig) -> (Converter, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let converter = Converter::with_engines(
        config,
        Arc::new(StubBackend {
            calls: Arc::clone(&calls),
        }),
        Arc::new(StubRecognizer {
            calls: Arc::clone(&calls),
        }),
    );
    (converter, calls)
}

pub fn fixture_bytes(pages: usize, text_pages: &[usize], flags: &[&str]) -> Vec<u8> {
    let text: Vec<String> = text_pages.iter().map(|p| p.to_string()).collect();
    let mut body = format!("%PDF-1.7 stub\npages={pages}\ntext={}\n", text.join(","));
    for flag in flags {
        body.push_str(flag);
        body.push('\n');
    }
    body.into_bytes()
}

/// A document whose every page has text.
pub fn digital(name: &str, pages: usize) -> SourceDocument {
    let text: Vec<usize> = (1..=pages).collect();
    SourceDocument::new(name, fixture_bytes(pages, &text, &[]))
}

/// A document with no text layer at all.
pub fn scanned(name: &str, pages: usize) -> SourceDocument {
    SourceDocument::new(name, fixture_bytes(pages, &[], &[]))
}

pub fn encrypted(name: &str) -> SourceDocument {
    SourceDocument::new(name, fixture_bytes(2, &[1, 2], &["encrypted"]))
}

pub fn corrupt(name: &str) -> SourceDocument {
    SourceDocument::new(name, fixture_bytes(1, &[1], &["corrupt"]))
}

/// Text of `word/document.xml` inside a written `.docx`.
pub fn document_xml(docx: &Path) -> String {
    use std::io::Read;
    let file = std::fs::File::open(docx).expect("open docx");
    let mut archive = zip::ZipArchive::new(file).expect("docx is a zip");
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .expect("document.xml present")
        .read_to_string(&mut xml)
        .expect("utf-8 xml");
    xml
}

/// Entry names of a zip file, in stored order.
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}
