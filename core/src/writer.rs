//! Serializes a [`DocTable`] and [`MemIndex`] into a single index file.
//!
//! Elements are streamed front to back. The records that point at them (a
//! region's bucket records, a chain's element offsets, a word's header with
//! its nested length) are collected while the elements go out and are
//! written in one piece once every offset is known, so the writer only
//! seeks once per chain and once per word, never per record.
//!
//! The file header is written last, after the body checksum is known, and
//! the file is synced. A crash before that point leaves a file without the
//! magic number, which readers reject.

use crate::error::{IndexError, Result};
use crate::index::{DocId, DocTable, MemIndex, Position, WordPostings};
use crate::layout::{
    BucketListHeader, BucketRecord, DiskRecord, DocElementHeader, ElementPositionRecord,
    FileHeader, PositionRecord, PositionsElementHeader, WordElementHeader, MAGIC_NUMBER,
};
use crate::table::ChainedTable;
use crc32fast::Hasher as Crc32Hasher;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

const CHECKSUM_CHUNK: usize = 8 * 1024;

fn narrow<T: TryFrom<u64>>(field: &'static str, value: u64) -> Result<T> {
    T::try_from(value).map_err(|_| IndexError::FieldOverflow { field, value })
}

/// Writes `bytes` at `offset`, then puts the cursor back at `resume`.
fn patch_at<W: Write + Seek>(w: &mut W, offset: u64, bytes: &[u8], resume: u64) -> Result<()> {
    w.seek(SeekFrom::Start(offset))?;
    w.write_all(bytes)?;
    w.seek(SeekFrom::Start(resume))?;
    Ok(())
}

/// CRC32 over `len` bytes read from `r`. A short read means the region is
/// not all there.
pub(crate) fn region_checksum<R: Read>(mut r: R, start: u64, len: u64) -> Result<u32> {
    let mut hasher = Crc32Hasher::new();
    let mut buf = vec![0u8; CHECKSUM_CHUNK];
    let mut left = len;
    while left > 0 {
        let want = left.min(CHECKSUM_CHUNK as u64) as usize;
        let got = r.read(&mut buf[..want])?;
        if got == 0 {
            return Err(IndexError::corrupt(start + (len - left), "body ends early"));
        }
        hasher.update(&buf[..got]);
        left -= got as u64;
    }
    Ok(hasher.finalize())
}

/// Write `table` as a region starting at `offset`, encoding each entry with
/// `encode(writer, element_offset, key, value) -> bytes_written`.
///
/// `encode` is called with the writer already at `element_offset` and must
/// leave it at the element's end. It may itself call `write_table` for a
/// nested region. Returns the region's total length, with the writer left
/// at the end of the region.
pub fn write_table<W, V, F>(w: &mut W, offset: u64, table: &ChainedTable<V>, mut encode: F) -> Result<u64>
where
    W: Write + Seek,
    F: FnMut(&mut W, u64, u64, &V) -> Result<u64>,
{
    let num_buckets: u32 = narrow("num_buckets", table.num_buckets() as u64)?;
    let records_len = BucketListHeader::SIZE + num_buckets as usize * BucketRecord::SIZE;
    let mut records = Vec::with_capacity(records_len);
    records.extend_from_slice(&BucketListHeader { num_buckets }.to_disk());

    let mut bucket_pos = offset + records_len as u64;
    for chain in table.buckets() {
        let chain_len: i32 = narrow("chain_len", chain.len() as u64)?;
        records.extend_from_slice(&BucketRecord { chain_len, chain_offset: bucket_pos }.to_disk());
        if !chain.is_empty() {
            bucket_pos += write_chain(w, bucket_pos, chain, &mut encode)?;
        }
    }

    patch_at(w, offset, &records, bucket_pos)?;
    Ok(bucket_pos - offset)
}

/// One bucket: the element-offset array, then the elements it points at.
fn write_chain<W, V, F>(w: &mut W, offset: u64, chain: &[(u64, V)], encode: &mut F) -> Result<u64>
where
    W: Write + Seek,
    F: FnMut(&mut W, u64, u64, &V) -> Result<u64>,
{
    let array_len = chain.len() * ElementPositionRecord::SIZE;
    let mut offsets = Vec::with_capacity(array_len);
    let mut element_pos = offset + array_len as u64;

    w.seek(SeekFrom::Start(element_pos))?;
    for (key, value) in chain {
        offsets.extend_from_slice(&ElementPositionRecord { elem_offset: element_pos }.to_disk());
        element_pos += encode(w, element_pos, *key, value)?;
    }

    patch_at(w, offset, &offsets, element_pos)?;
    Ok(element_pos - offset)
}

fn write_doc_element<W: Write + Seek>(w: &mut W, _offset: u64, doc_id: DocId, name: &String) -> Result<u64> {
    let name_len: i16 = narrow("name_len", name.len() as u64)?;
    let mut buf = Vec::with_capacity(DocElementHeader::SIZE + name.len());
    buf.extend_from_slice(&DocElementHeader { doc_id, name_len }.to_disk());
    buf.extend_from_slice(name.as_bytes());
    w.write_all(&buf)?;
    Ok(buf.len() as u64)
}

fn write_positions_element<W: Write + Seek>(
    w: &mut W,
    _offset: u64,
    doc_id: DocId,
    positions: &Vec<Position>,
) -> Result<u64> {
    let num_positions: i32 = narrow("num_positions", positions.len() as u64)?;
    let mut buf = Vec::with_capacity(PositionsElementHeader::SIZE + positions.len() * PositionRecord::SIZE);
    buf.extend_from_slice(&PositionsElementHeader { doc_id, num_positions }.to_disk());
    for &position in positions {
        buf.extend_from_slice(&PositionRecord { position }.to_disk());
    }
    w.write_all(&buf)?;
    Ok(buf.len() as u64)
}

fn write_word_element<W: Write + Seek>(w: &mut W, offset: u64, _hash: u64, wp: &WordPostings) -> Result<u64> {
    let word_len: i16 = narrow("word_len", wp.word.len() as u64)?;
    let head_len = WordElementHeader::SIZE + wp.word.len();

    // Postings first: the header needs their length.
    let nested_bytes = write_table(w, offset + head_len as u64, &wp.postings, write_positions_element)?;
    let nested_len: i32 = narrow("nested_len", nested_bytes)?;

    let mut head = Vec::with_capacity(head_len);
    head.extend_from_slice(&WordElementHeader { word_len, nested_len }.to_disk());
    head.extend_from_slice(wp.word.as_bytes());
    let total = head_len as u64 + nested_bytes;
    patch_at(w, offset, &head, offset + total)?;
    Ok(total)
}

/// Write `doc_table` and `index` to `path`, returning the file's length.
///
/// On any failure the partially written file is removed.
pub fn write_index(index: &MemIndex, doc_table: &DocTable, path: &Path) -> Result<u64> {
    match write_index_file(index, doc_table, path) {
        Ok(total) => {
            tracing::info!(path = %path.display(), bytes = total, docs = doc_table.len(), words = index.num_words(), "index written");
            Ok(total)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "index write failed; removing partial file");
            if let Err(rm) = fs::remove_file(path) {
                tracing::debug!(error = %rm, "could not remove partial index file");
            }
            Err(e)
        }
    }
}

fn write_index_file(index: &MemIndex, doc_table: &DocTable, path: &Path) -> Result<u64> {
    let file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
    let mut w = BufWriter::new(file);

    let mut cur = FileHeader::SIZE as u64;
    let doctable_bytes = write_table(&mut w, cur, doc_table.id_to_name(), write_doc_element)?;
    tracing::debug!(offset = cur, bytes = doctable_bytes, "doc table region written");
    cur += doctable_bytes;

    let index_bytes = write_table(&mut w, cur, index.words(), write_word_element)?;
    tracing::debug!(offset = cur, bytes = index_bytes, "inverted index region written");
    cur += index_bytes;

    let mut file: File = w.into_inner().map_err(|e| e.into_error())?;
    let header = write_header(&mut file, doctable_bytes, index_bytes)?;
    debug_assert_eq!(header.expected_file_len(), cur);
    Ok(cur)
}

fn write_header(file: &mut File, doctable_bytes: u64, index_bytes: u64) -> Result<FileHeader> {
    let body_start = FileHeader::SIZE as u64;
    file.seek(SeekFrom::Start(body_start))?;
    let checksum = region_checksum(&mut *file, body_start, doctable_bytes + index_bytes)?;

    let header = FileHeader {
        magic: MAGIC_NUMBER,
        checksum,
        doctable_bytes: narrow("doctable_bytes", doctable_bytes)?,
        index_bytes: narrow("index_bytes", index_bytes)?,
    };
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.to_disk())?;
    file.sync_all()?;
    Ok(header)
}
