//! Plain container file: a JSON header line followed by one JSON triple per
//! line, gzip-compressed when the file name ends in `.gz`.

use std::fs::File;
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::Path;

use flate2::read::GzDecoder;
use memmap2::{Mmap, MmapOptions};
use serde::{Deserialize, Serialize};
use tripleops_core::LoadStrategy;
use tripleops_logging::op_debug;

use crate::persist::{is_gzip, AtomicFileWriter};
use crate::plain_backend::report_every;
use crate::{PlainStore, ProgressListener, StorageError, Triple};

const FORMAT_TAG: &str = "tripleops-container";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ContainerHeader {
    format: String,
    version: u32,
    base_id: Option<String>,
    triples: u64,
}

enum FileBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(map) => map,
            FileBytes::Owned(bytes) => bytes,
        }
    }
}

pub(crate) fn read_container(
    path: &Path,
    strategy: LoadStrategy,
    listener: &mut dyn ProgressListener,
) -> Result<PlainStore, StorageError> {
    listener.notify_progress(0.0, "Reading container")?;
    let raw = match strategy {
        LoadStrategy::Mapped => map_file(path)?,
        LoadStrategy::Materialized => {
            FileBytes::Owned(std::fs::read(path).map_err(|e| StorageError::file(path, e))?)
        }
    };
    op_debug!("read {} bytes from {} ({:?})", raw.len(), path.display(), strategy);

    let decoded;
    let text: &str = if is_gzip(path) {
        let mut out = String::new();
        GzDecoder::new(&raw[..])
            .read_to_string(&mut out)
            .map_err(|e| invalid(path, format!("gzip stream: {e}")))?;
        decoded = out;
        &decoded
    } else {
        std::str::from_utf8(&raw).map_err(|e| invalid(path, e.to_string()))?
    };
    listener.notify_progress(10.0, "Decoding triples")?;

    let mut lines = text.lines();
    let header_line = lines.next().ok_or_else(|| invalid(path, "empty file"))?;
    let header: ContainerHeader =
        serde_json::from_str(header_line).map_err(|e| invalid(path, format!("header: {e}")))?;
    if header.format != FORMAT_TAG {
        return Err(invalid(path, format!("unknown format {:?}", header.format)));
    }
    if header.version != FORMAT_VERSION {
        return Err(invalid(path, format!("unsupported version {}", header.version)));
    }

    let total = header.triples;
    let mut triples = Vec::with_capacity(usize::try_from(total).unwrap_or(0).min(1 << 20));
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let triple: Triple = serde_json::from_str(line).map_err(|e| StorageError::Malformed {
            path: path.to_path_buf(),
            line: index + 2,
            message: e.to_string(),
        })?;
        triples.push(triple);
        let done = triples.len() as u64;
        if report_every(done, total) {
            let level = 10.0 + 90.0 * done as f32 / total.max(1) as f32;
            listener.notify_progress(level, "Decoding triples")?;
        }
    }
    if triples.len() as u64 != total {
        return Err(invalid(
            path,
            format!("header promises {total} triples, found {}", triples.len()),
        ));
    }

    Ok(PlainStore::new(triples, header.base_id))
}

pub(crate) fn write_container(
    store: &PlainStore,
    path: &Path,
    listener: &mut dyn ProgressListener,
) -> Result<(), StorageError> {
    let header = ContainerHeader {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        base_id: store.base_id().map(str::to_string),
        triples: store.len() as u64,
    };
    let total = header.triples;

    listener.notify_progress(0.0, "Saving container")?;
    AtomicFileWriter::new(path).write_with(|out| {
        serde_json::to_writer(&mut *out, &header)?;
        out.write_all(b"\n")?;
        for (index, triple) in store.triples().iter().enumerate() {
            serde_json::to_writer(&mut *out, triple)?;
            out.write_all(b"\n")?;
            let done = index as u64 + 1;
            if report_every(done, total) {
                listener.notify_progress(100.0 * done as f32 / total as f32, "Saving container")?;
            }
        }
        Ok(())
    })?;
    listener.notify_progress(100.0, "Saving container")?;
    Ok(())
}

fn map_file(path: &Path) -> Result<FileBytes, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::file(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| StorageError::file(path, e))?
        .len();
    if len == 0 {
        // Zero-length mappings are rejected on some platforms.
        return Ok(FileBytes::Owned(Vec::new()));
    }
    // Safety: the mapping is only read, and only for the duration of this load.
    let map = unsafe { MmapOptions::new().map(&file) }.map_err(|e| StorageError::file(path, e))?;
    Ok(FileBytes::Mapped(map))
}

fn invalid(path: &Path, message: impl Into<String>) -> StorageError {
    StorageError::InvalidContainer {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
