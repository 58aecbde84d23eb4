//! Input staging: put a PDF somewhere pdfium can open it.
//!
//! pdfium needs a file-system path; it cannot read from a byte buffer. Two
//! entry points cover the two transports:
//!
//! * [`stage_document`]: the orchestrator writes uploaded bytes into a
//!   private [`TempDir`] per document; the directory disappears once the
//!   document's outcome is final.
//! * [`load_source`]: the CLI turns a local path or an `http(s)://` URL
//!   into a [`SourceDocument`].
//!
//! Both check for the `%PDF` magic so callers get a meaningful error rather
//! than a pdfium failure.

use crate::error::ConvertError;
use crate::output::SourceDocument;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// How far into the file the `%PDF` header may appear. Some producers emit
/// a few bytes of junk before it, which readers tolerate.
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// A document written to its own staging directory.
#[derive(Debug)]
pub struct StagedDocument {
    path: PathBuf,
    dir: TempDir,
}

impl StagedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The staging directory, for scratch files that share its lifetime.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the staging directory, reporting failure instead of ignoring it.
    pub fn release(self) -> Result<(), ConvertError> {
        let dir = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| ConvertError::io(dir, e))
    }
}

/// True when `bytes` carry a PDF header near the start.
pub fn is_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ConvertError> {
    if is_pdf(bytes) {
        Ok(())
    } else {
        Err(ConvertError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Write a document's bytes to `input.pdf` inside a fresh directory under
/// `workspace`.
pub fn stage_document(doc: &SourceDocument, workspace: &Path) -> Result<StagedDocument, ConvertError> {
    check_magic(&doc.name, &doc.bytes)?;

    let dir = tempfile::Builder::new()
        .prefix("doc-")
        .tempdir_in(workspace)
        .map_err(|e| ConvertError::io(workspace, e))?;
    let path = dir.path().join("input.pdf");
    std::fs::write(&path, &doc.bytes).map_err(|e| ConvertError::io(&path, e))?;

    debug!("Staged '{}' at {}", doc.name, path.display());
    Ok(StagedDocument { path, dir })
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read a local path or download a URL into a [`SourceDocument`].
pub async fn load_source(input: &str, timeout_secs: u64) -> Result<SourceDocument, ConvertError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<SourceDocument, ConvertError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConvertError::FileNotFound { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied { path });
        }
        Err(e) => return Err(ConvertError::io(path, e)),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    check_magic(&name, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(SourceDocument::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, ConvertError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| ConvertError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let name = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    check_magic(&name, &bytes)?;

    info!("Downloaded '{}' ({} bytes)", name, bytes.len());
    Ok(SourceDocument::new(name, bytes.to_vec()))
}

/// Last path segment of the URL, or `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.7\n"));
        assert!(is_pdf(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://x.org/papers/a.pdf"), "a.pdf");
        assert_eq!(filename_from_url("https://x.org/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://x.org/"), "downloaded.pdf");
    }

    #[test]
    fn test_stage_and_release() {
        let workspace = tempfile::tempdir().unwrap();
        let doc = SourceDocument::new("a.pdf", b"%PDF-1.7 body".to_vec());
        let staged = stage_document(&doc, workspace.path()).unwrap();
        assert_eq!(std::fs::read(staged.path()).unwrap(), doc.bytes);

        let dir = staged.dir().to_path_buf();
        staged.release().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_stage_rejects_non_pdf() {
        let workspace = tempfile::tempdir().unwrap();
        let doc = SourceDocument::new("notes.pdf", b"hello".to_vec());
        let err = stage_document(&doc, workspace.path()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnreadableDocument);
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_source("/nonexistent/file.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }
}
