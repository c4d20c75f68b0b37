mod common;

use common::fruit_tables;
use filesearch_core::{write_index, HashTableReader, IndexError, IndexFileReader};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn fruit_file() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fruit.idx");
    let (dt, mi) = fruit_tables();
    write_index(&mi, &dt, &path).unwrap();
    (dir, path)
}

fn flip_byte(path: &Path, at: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[at] ^= 0x5a;
    fs::write(path, bytes).unwrap();
}

/// Store `bytes` at `path` with a header checksum that matches the body.
fn write_resealed(path: &Path, mut bytes: Vec<u8>) {
    let crc = crc32fast::hash(&bytes[16..]);
    bytes[4..8].copy_from_slice(&crc.to_be_bytes());
    fs::write(path, bytes).unwrap();
}

fn corrupt_offset(err: IndexError) -> u64 {
    match err {
        IndexError::Corrupt { offset, .. } => offset,
        other => panic!("expected a corrupt-index error, got {other}"),
    }
}

#[test]
fn any_flipped_body_byte_fails_validation() {
    let (_dir, path) = fruit_file();
    let pristine = fs::read(&path).unwrap();
    for at in 16..pristine.len() {
        fs::write(&path, &pristine).unwrap();
        flip_byte(&path, at);
        let err = IndexFileReader::open(&path, true).unwrap_err();
        assert!(matches!(err, IndexError::ChecksumMismatch { .. }), "byte {at}: {err}");
    }
}

#[test]
fn flipped_body_passes_when_validation_is_off() {
    let (_dir, path) = fruit_file();
    let len = fs::metadata(&path).unwrap().len() as usize;
    flip_byte(&path, len - 1);
    assert!(IndexFileReader::open(&path, false).is_ok());
}

#[test]
fn bad_magic_is_rejected_first() {
    let (_dir, path) = fruit_file();
    flip_byte(&path, 0);
    // Truncate too: the magic check must win over the length check.
    let mut bytes = fs::read(&path).unwrap();
    bytes.pop();
    fs::write(&path, bytes).unwrap();
    let err = IndexFileReader::open(&path, true).unwrap_err();
    assert!(matches!(err, IndexError::BadMagic { .. }), "{err}");
    assert!(err.is_corruption());
}

#[test]
fn truncated_file_is_a_length_mismatch() {
    let (_dir, path) = fruit_file();
    let mut bytes = fs::read(&path).unwrap();
    let full = bytes.len() as u64;
    bytes.truncate(bytes.len() - 3);
    fs::write(&path, bytes).unwrap();
    match IndexFileReader::open(&path, false).unwrap_err() {
        IndexError::LengthMismatch { expected, actual } => {
            assert_eq!(expected, full);
            assert_eq!(actual, full - 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tiny_or_missing_files_are_rejected() {
    let dir = tempdir().unwrap();
    let tiny = dir.path().join("tiny.idx");
    fs::write(&tiny, [0xCA, 0xFE]).unwrap();
    assert!(IndexFileReader::open(&tiny, true).unwrap_err().is_corruption());

    let missing = dir.path().join("missing.idx");
    assert!(matches!(IndexFileReader::open(&missing, true), Err(IndexError::Io(_))));
}

#[test]
fn failed_write_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("toolong.idx");
    let (mut dt, mi) = fruit_tables();
    dt.add(&"n".repeat(40_000));
    let err = write_index(&mi, &dt, &path).unwrap_err();
    assert!(matches!(err, IndexError::FieldOverflow { .. }));
    assert!(!path.exists());
}

#[test]
fn header_is_big_endian_with_region_lengths() {
    let (_dir, path) = fruit_file();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xF0, 0x0D]);
    let file = IndexFileReader::open(&path, true).unwrap();
    let h = file.header();
    assert_eq!(
        16 + u64::from(h.doctable_bytes) + u64::from(h.index_bytes),
        bytes.len() as u64
    );
    assert_eq!(h.checksum, crc32fast::hash(&bytes[16..]));
}

// Doc table region starts at 16: 4-byte bucket count, then 12-byte bucket
// records. With two buckets, doc 2 lands in bucket 0 and doc 1 in bucket 1.
const BUCKET0_CHAIN_LEN: usize = 20;
const BUCKET1_CHAIN_LEN: usize = 32;

#[test]
fn inflated_chain_length_is_an_error_not_an_allocation() {
    let (_dir, path) = fruit_file();
    let mut bytes = fs::read(&path).unwrap();
    bytes[BUCKET0_CHAIN_LEN..BUCKET0_CHAIN_LEN + 4].copy_from_slice(&i32::MAX.to_be_bytes());
    write_resealed(&path, bytes);

    let file = IndexFileReader::open(&path, true).unwrap();
    let docs = file.doc_table_reader().unwrap();
    assert!(docs.lookup_doc_id(2).unwrap_err().is_corruption());
    assert_eq!(docs.lookup_doc_id(1).unwrap().as_deref(), Some("A"));
}

#[test]
fn negative_chain_length_points_at_its_bucket_record() {
    let (_dir, path) = fruit_file();
    let mut bytes = fs::read(&path).unwrap();
    bytes[BUCKET1_CHAIN_LEN..BUCKET1_CHAIN_LEN + 4].copy_from_slice(&(-1i32).to_be_bytes());
    write_resealed(&path, bytes);

    let file = IndexFileReader::open(&path, true).unwrap();
    let err = file.doc_table_reader().unwrap().lookup_doc_id(1).unwrap_err();
    assert_eq!(corrupt_offset(err), BUCKET1_CHAIN_LEN as u64);
}

#[test]
fn inflated_position_count_is_an_error_not_an_allocation() {
    let (_dir, path) = fruit_file();
    let file = IndexFileReader::open(&path, true).unwrap();
    let postings = file.word_table_reader().unwrap().lookup_word("banana").unwrap().unwrap();
    let len = fs::metadata(&path).unwrap().len();
    let table = HashTableReader::open(Arc::new(File::open(&path).unwrap()), len, postings.offset()).unwrap();
    let elem = table.all_element_positions().unwrap()[0] as usize;
    drop(file);

    let mut bytes = fs::read(&path).unwrap();
    let doc_id = u64::from_be_bytes(bytes[elem..elem + 8].try_into().unwrap());
    bytes[elem + 8..elem + 12].copy_from_slice(&i32::MAX.to_be_bytes());
    write_resealed(&path, bytes);

    let file = IndexFileReader::open(&path, true).unwrap();
    let postings = file.word_table_reader().unwrap().lookup_word("banana").unwrap().unwrap();
    let err = postings.lookup_doc_id(doc_id).unwrap_err();
    assert_eq!(corrupt_offset(err), elem as u64 + 12);
}
