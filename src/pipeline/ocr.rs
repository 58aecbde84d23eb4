//! Tesseract OCR over rendered pages.
//!
//! Tesseract is driven through its command line (`tesseract <image> stdout
//! -l <lang>`), so no native binding is linked and the engine is optional
//! at build time. It is only needed at run time, and only for scanned
//! documents.

use crate::backend::{RenderedPage, TextRecognizer};
use crate::error::ConvertError;
use std::process::Command;
use tracing::debug;

/// Runs the `tesseract` executable on each page image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    /// True when the executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, page: &RenderedPage) -> Result<String, ConvertError> {
        let output = Command::new(&self.command)
            .arg(&page.image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout).to_string();
                debug!("OCR page {} → {} chars", page.index + 1, text.len());
                Ok(text)
            }
            Ok(output) => Err(ConvertError::OcrFailed {
                page: page.index + 1,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConvertError::OcrUnavailable(
                format!("'{}' not found (install tesseract-ocr)", self.command),
            )),
            Err(e) => Err(ConvertError::io(&page.image_path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::path::PathBuf;

    #[test]
    fn missing_executable_is_an_engine_failure() {
        let recognizer = TesseractRecognizer::new("definitely-not-tesseract-7f3a", "eng");
        assert!(!recognizer.is_available());

        let err = recognizer
            .recognize(&RenderedPage {
                index: 0,
                image_path: PathBuf::from("page-1.png"),
            })
            .unwrap_err();
        assert!(matches!(err, ConvertError::OcrUnavailable(_)));
        assert_eq!(err.kind(), FailureKind::ConversionEngineFailure);
    }
}
