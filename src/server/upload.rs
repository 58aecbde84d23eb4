//! Multipart form parsing shared by every conversion route.

use super::error::ApiError;
use crate::config::PageRange;
use crate::output::SourceDocument;
use crate::pipeline::input;
use axum::extract::Multipart;

/// Form fields accepted as PDF uploads.
const FILE_FIELDS: &[&str] = &["pdfFile", "pdfFiles", "pdfFiles[]", "file", "files"];

/// A parsed conversion request.
#[derive(Debug)]
pub struct Upload {
    pub files: Vec<SourceDocument>,
    pub pages: Option<PageRange>,
}

/// Read every file field plus `start_page` / `end_page`.
///
/// Rejects the request when no file was sent, when a file is not named
/// `*.pdf`, or when its bytes are not a PDF.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut files = Vec::new();
    let mut start = None;
    let mut end = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;

            // Browsers send an empty part for an untouched file input.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            if !file_name.to_lowercase().ends_with(".pdf") || !input::is_pdf(&bytes) {
                return Err(ApiError::BadRequest("Only PDF files allowed".into()));
            }
            files.push(SourceDocument::new(file_name, bytes.to_vec()));
        } else if name == "start_page" || name == "end_page" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
            let page = parse_page(&name, &text)?;
            if name == "start_page" {
                start = page;
            } else {
                end = page;
            }
        }
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }

    let pages = match (start, end) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(PageRange::new(start, end)),
        _ => {
            return Err(ApiError::BadRequest(
                "start_page and end_page must be given together".into(),
            ))
        }
    };

    Ok(Upload { files, pages })
}

/// Blank means "not given".
fn parse_page(field: &str, text: &str) -> Result<Option<usize>, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field} '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_page_fields_are_absent() {
        assert_eq!(parse_page("start_page", "  ").unwrap(), None);
        assert_eq!(parse_page("start_page", "3").unwrap(), Some(3));
        assert!(parse_page("end_page", "three").is_err());
    }
}
