use std::fs;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tripleops_engine::{ensure_output_dir, AtomicFileWriter, StorageError};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn rejects_a_file_where_a_directory_is_expected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_output_dir(&file_path).is_err());

    let result = AtomicFileWriter::new(file_path.join("data.nt")).write_bytes(b"data");
    assert!(result.is_err());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("data.nt");
    let writer = AtomicFileWriter::new(&target);

    writer.write_bytes(b"hello").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

    writer.write_bytes(b"world").unwrap();
    assert_eq!(fs::read_to_string(writer.target()).unwrap(), "world");
}

#[test]
fn failed_body_keeps_previous_content_and_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("data.nt");
    fs::write(&target, "previous").unwrap();

    let result = AtomicFileWriter::new(&target).write_with(|out| {
        out.write_all(b"partial")?;
        Err(StorageError::Io(std::io::Error::other("body gave up")))
    });

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
    let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn gz_targets_are_compressed() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("data.nt.gz");

    AtomicFileWriter::new(&target)
        .write_bytes(b"<a> <b> <c> .\n")
        .unwrap();

    let raw = fs::read(&target).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    let mut text = String::new();
    GzDecoder::new(&raw[..]).read_to_string(&mut text).unwrap();
    assert_eq!(text, "<a> <b> <c> .\n");
}
