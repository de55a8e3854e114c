use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::StorageError;

/// Writes a file by streaming into a temp file beside it, then renaming over
/// the target. Readers never see a half-written file; a failed write leaves
/// any previous file untouched.
///
/// Targets ending in `.gz` are gzip-compressed on the way out.
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_with<F>(&self, body: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), StorageError>,
    {
        let dir = parent_dir(&self.target);
        ensure_output_dir(dir)?;

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| StorageError::file(dir, e))?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            if is_gzip(&self.target) {
                let mut encoder = GzEncoder::new(&mut out, Compression::default());
                body(&mut encoder)?;
                encoder
                    .try_finish()
                    .map_err(|e| StorageError::file(&self.target, e))?;
            } else {
                body(&mut out)?;
            }
            out.flush().map_err(|e| StorageError::file(&self.target, e))?;
        }
        tmp.as_file_mut()
            .sync_all()
            .map_err(|e| StorageError::file(&self.target, e))?;

        tmp.persist(&self.target)
            .map_err(|e| StorageError::file(&self.target, e.error))?;
        Ok(())
    }

    pub fn write_bytes(&self, content: &[u8]) -> Result<(), StorageError> {
        let target = self.target.clone();
        self.write_with(|out| {
            out.write_all(content)
                .map_err(|e| StorageError::file(&target, e))
        })
    }
}

/// Ensure the output directory exists; create it if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StorageError::file(dir, e))?;
        if !meta.is_dir() {
            return Err(StorageError::file(
                dir,
                std::io::Error::other("path is not a directory"),
            ));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StorageError::file(dir, e))?;
    }
    Ok(())
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
