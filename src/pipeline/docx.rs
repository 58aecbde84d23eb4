//! Word document assembly with docx-rs.
//!
//! Two writers, one per conversion path:
//!
//! * [`write_structured`]: laid-out pages: paragraphs, tables and images,
//!   with a page break between source pages.
//! * [`write_plain`]: OCR output: one paragraph per page, the page's lines
//!   separated by soft line breaks.
//!
//! The file is written to a sibling `.tmp` path and renamed into place, so
//! a failed write never leaves a truncated `.docx` behind.

use crate::error::ConvertError;
use crate::pipeline::layout::Block;
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run, Table, TableCell, TableRow};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// English Metric Units per pixel at 96 DPI.
const EMU_PER_PX: u32 = 9525;
/// Widest image placed in the document: 6 inches of a Letter/A4 text column.
const MAX_IMAGE_WIDTH_EMU: u32 = 6 * 914_400;

/// Write laid-out pages, in order, with page breaks between them.
pub fn write_structured(pages: &[Vec<Block>], output: &Path) -> Result<(), ConvertError> {
    let mut docx = Docx::new();
    for (i, blocks) in pages.iter().enumerate() {
        if i > 0 {
            docx = docx.add_paragraph(page_break());
        }
        for block in blocks {
            docx = match block {
                Block::Paragraph(text) => docx.add_paragraph(text_paragraph(text)),
                Block::Table(rows) => docx.add_table(table(rows)),
                Block::Image(image) => {
                    docx.add_paragraph(image_paragraph(&image.png, image.width, image.height))
                }
            };
        }
    }
    debug!("Writing structured document with {} pages", pages.len());
    pack(docx, output)
}

/// Write one paragraph per page of recognised text.
pub fn write_plain<S: AsRef<str>>(pages: &[S], output: &Path) -> Result<(), ConvertError> {
    let mut docx = Docx::new();
    for page in pages {
        let mut run = Run::new();
        for (i, line) in page.as_ref().lines().enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line);
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(run));
    }
    debug!("Writing plain document with {} pages", pages.len());
    pack(docx, output)
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn table(rows: &[Vec<String>]) -> Table {
    Table::new(
        rows.iter()
            .map(|row| {
                TableRow::new(
                    row.iter()
                        .map(|cell| TableCell::new().add_paragraph(text_paragraph(cell)))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn image_paragraph(png: &[u8], width_px: u32, height_px: u32) -> Paragraph {
    let (w, h) = image_extent_emu(width_px, height_px);
    Paragraph::new().add_run(Run::new().add_image(Pic::new(png).size(w, h)))
}

/// Size an image at 96 DPI, scaled down to fit the text column.
fn image_extent_emu(width_px: u32, height_px: u32) -> (u32, u32) {
    let w = width_px.max(1).saturating_mul(EMU_PER_PX);
    let h = height_px.max(1).saturating_mul(EMU_PER_PX);
    if w <= MAX_IMAGE_WIDTH_EMU {
        return (w, h);
    }
    let scale = MAX_IMAGE_WIDTH_EMU as f64 / w as f64;
    (MAX_IMAGE_WIDTH_EMU, ((h as f64) * scale).round() as u32)
}

fn pack(docx: Docx, output: &Path) -> Result<(), ConvertError> {
    let write_failed = |detail: String| ConvertError::DocxWriteFailed {
        path: output.to_path_buf(),
        detail,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }

    let tmp = output.with_extension("docx.tmp");
    let file = File::create(&tmp).map_err(|e| ConvertError::io(&tmp, e))?;
    if let Err(e) = docx.build().pack(file) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_failed(e.to_string()));
    }
    std::fs::rename(&tmp, output).map_err(|e| ConvertError::io(output, e))
}
