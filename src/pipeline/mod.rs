//! Pipeline stages for PDF-to-DOCX conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and swapped (another PDF library, another OCR engine) without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//!                     ┌─▶ render (text runs) ─▶ layout ─▶ postprocess ─┐
//! input ─▶ classify ──┤                                               ├─▶ docx ─▶ archive
//! (stage)             └─▶ render (pixels) ───▶ ocr ────▶ postprocess ─┘
//! ```
//!
//! 1. [`input`]      : stage uploaded bytes (or a path/URL) as a local PDF
//! 2. [`render`]     : pdfium: metadata, text runs, embedded images, rasters;
//!    blocking, so callers run it in `spawn_blocking`
//! 3. [`layout`]     : group text runs into lines, paragraphs and tables
//! 4. [`ocr`]        : tesseract over rendered pages (scanned documents only)
//! 5. [`postprocess`]: deterministic text cleanup shared by both paths
//! 6. [`docx`]       : write the Word document with docx-rs
//! 7. [`archive`]    : zip several Word documents for a batch download

pub mod archive;
pub mod docx;
pub mod input;
pub mod layout;
pub mod ocr;
pub mod postprocess;
pub mod render;
