//! Zip packaging for multi-document batches.

use crate::error::ConvertError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name of the archive returned for multi-document batches.
pub const ARCHIVE_NAME: &str = "converted_files.zip";

/// Write `(entry_name, file_on_disk)` pairs into a deflated zip at `output`.
///
/// Entries are written in the order given. Entry names must already be
/// unique; see [`crate::output::unique_output_names`].
pub fn write_archive(entries: &[(String, PathBuf)], output: &Path) -> Result<(), ConvertError> {
    let failed = |detail: String| ConvertError::ArchiveFailed {
        path: output.to_path_buf(),
        detail,
    };

    let file = File::create(output).map_err(|e| ConvertError::io(output, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(|e| failed(format!("{name}: {e}")))?;
        let mut source = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        std::io::copy(&mut source, &mut zip).map_err(|e| ConvertError::io(path, e))?;
        debug!("Archived {} as {}", path.display(), name);
    }

    zip.finish().map_err(|e| failed(e.to_string()))?;
    Ok(())
}
