//! Random-access readers over the regions of an index file.
//!
//! Readers never move a shared file cursor: every access is a positioned
//! read against an `Arc<File>`, so a doc-table reader and a word-table
//! reader over the same file can be interleaved freely, and cloned readers
//! can be handed to other threads.

use crate::error::{IndexError, Result};
use crate::index::{DocId, Position};
use crate::layout::{
    BucketListHeader, BucketRecord, DiskRecord, DocElementHeader, ElementPositionRecord,
    PositionRecord, PositionsElementHeader, WordElementHeader, MAX_RECORD_SIZE,
};
use crate::table::{bucket_for, hash_word};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::sync::Arc;

#[cfg(unix)]
fn file_read_at_exact(file: &File, pos: u64, buf: &mut [u8]) -> io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, pos)
}

#[cfg(windows)]
fn file_read_at_exact(file: &File, mut pos: u64, mut buf: &mut [u8]) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, pos) {
            Ok(0) => break,
            Ok(n) => {
                buf = &mut buf[n..];
                pos += n as u64;
            }
            Err(e) => return Err(e),
        }
    }
    if !buf.is_empty() {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

pub(crate) fn read_exact_at(file: &File, pos: u64, buf: &mut [u8]) -> Result<()> {
    file_read_at_exact(file, pos, buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            IndexError::corrupt(pos, format!("short read of {} bytes", buf.len()))
        } else {
            IndexError::Io(e)
        }
    })
}

pub(crate) fn read_record<R: DiskRecord>(file: &File, pos: u64) -> Result<R> {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let buf = &mut buf[..R::SIZE];
    read_exact_at(file, pos, buf)?;
    Ok(R::decode(buf))
}

fn read_bytes(file: &File, pos: u64, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_exact_at(file, pos, &mut buf)?;
    Ok(buf)
}

fn non_negative<T: Into<i64>>(value: T, pos: u64, what: &str) -> Result<usize> {
    let v: i64 = value.into();
    usize::try_from(v).map_err(|_| IndexError::corrupt(pos, format!("negative {what}: {v}")))
}

/// Bucket-level access to one serialized hash-table region.
///
/// Only the bucket count is read up front; everything else is fetched on
/// demand. Lookups return *candidate* element offsets: distinct keys can
/// share a bucket, so callers read each element and compare its stored key.
///
/// Every variable-length read is checked against the file length before a
/// buffer is allocated for it, so a count inflated by corruption comes back
/// as [`IndexError::Corrupt`].
#[derive(Debug, Clone)]
pub struct HashTableReader {
    file: Arc<File>,
    file_len: u64,
    offset: u64,
    num_buckets: u32,
}

impl HashTableReader {
    pub fn open(file: Arc<File>, file_len: u64, offset: u64) -> Result<Self> {
        let header: BucketListHeader = read_record(&file, offset)?;
        if header.num_buckets == 0 {
            return Err(IndexError::corrupt(offset, "region has zero buckets"));
        }
        let records_end = offset
            + BucketListHeader::SIZE as u64
            + u64::from(header.num_buckets) * BucketRecord::SIZE as u64;
        if records_end > file_len {
            return Err(IndexError::corrupt(
                offset,
                format!("{} bucket records run past end of file", header.num_buckets),
            ));
        }
        Ok(Self { file, file_len, offset, num_buckets: header.num_buckets })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    pub(crate) fn file(&self) -> &Arc<File> {
        &self.file
    }

    pub(crate) fn file_len(&self) -> u64 {
        self.file_len
    }

    /// `count` records of `size` bytes starting at `pos`.
    pub(crate) fn read_span(&self, pos: u64, count: usize, size: usize, what: &str) -> Result<Vec<u8>> {
        let end = count
            .checked_mul(size)
            .and_then(|len| pos.checked_add(len as u64))
            .filter(|&end| end <= self.file_len)
            .ok_or_else(|| IndexError::corrupt(pos, format!("{what} of {count} entries runs past end of file")))?;
        read_bytes(&self.file, pos, (end - pos) as usize)
    }

    /// Element offsets of one bucket's chain.
    fn chain_offsets(&self, bucket: u64) -> Result<Vec<u64>> {
        let rec_pos = self.offset + BucketListHeader::SIZE as u64 + bucket * BucketRecord::SIZE as u64;
        let rec: BucketRecord = read_record(&self.file, rec_pos)?;
        let chain_len = non_negative(rec.chain_len, rec_pos, "chain length")?;
        if chain_len == 0 {
            return Ok(Vec::new());
        }
        let raw = self.read_span(rec.chain_offset, chain_len, ElementPositionRecord::SIZE, "chain")?;
        Ok(raw
            .chunks_exact(ElementPositionRecord::SIZE)
            .map(|c| ElementPositionRecord::decode(c).elem_offset)
            .collect())
    }

    /// Offsets of every element in the bucket `key_hash` maps to, in chain order.
    pub fn lookup_element_positions(&self, key_hash: u64) -> Result<Vec<u64>> {
        self.chain_offsets(bucket_for(key_hash, u64::from(self.num_buckets)))
    }

    /// Offsets of every element in the region, bucket by bucket.
    pub fn all_element_positions(&self) -> Result<Vec<u64>> {
        let mut out = Vec::new();
        for bucket in 0..u64::from(self.num_buckets) {
            out.extend(self.chain_offsets(bucket)?);
        }
        Ok(out)
    }
}

/// Doc id -> document name.
#[derive(Debug, Clone)]
pub struct DocTableReader {
    table: HashTableReader,
}

impl DocTableReader {
    pub fn open(file: Arc<File>, file_len: u64, offset: u64) -> Result<Self> {
        Ok(Self { table: HashTableReader::open(file, file_len, offset)? })
    }

    pub fn num_buckets(&self) -> u32 {
        self.table.num_buckets()
    }

    pub fn lookup_doc_id(&self, doc_id: DocId) -> Result<Option<String>> {
        let file = self.table.file();
        for pos in self.table.lookup_element_positions(doc_id)? {
            let header: DocElementHeader = read_record(file, pos)?;
            if header.doc_id != doc_id {
                continue;
            }
            let len = non_negative(header.name_len, pos, "name length")?;
            let raw = self.table.read_span(pos + DocElementHeader::SIZE as u64, len, 1, "document name")?;
            let name = String::from_utf8(raw)
                .map_err(|_| IndexError::corrupt(pos, "document name is not UTF-8"))?;
            return Ok(Some(name));
        }
        Ok(None)
    }
}

/// Word -> postings table.
#[derive(Debug, Clone)]
pub struct WordTableReader {
    table: HashTableReader,
}

impl WordTableReader {
    pub fn open(file: Arc<File>, file_len: u64, offset: u64) -> Result<Self> {
        Ok(Self { table: HashTableReader::open(file, file_len, offset)? })
    }

    pub fn num_buckets(&self) -> u32 {
        self.table.num_buckets()
    }

    pub fn lookup_word(&self, word: &str) -> Result<Option<PostingsReader>> {
        let file = self.table.file();
        for pos in self.table.lookup_element_positions(hash_word(word))? {
            let header: WordElementHeader = read_record(file, pos)?;
            let len = non_negative(header.word_len, pos, "word length")?;
            if len != word.len() {
                continue;
            }
            let stored = self.table.read_span(pos + WordElementHeader::SIZE as u64, len, 1, "word")?;
            if stored == word.as_bytes() {
                let nested = pos + (WordElementHeader::SIZE + len) as u64;
                return PostingsReader::open(Arc::clone(file), self.table.file_len(), nested).map(Some);
            }
        }
        Ok(None)
    }
}

/// One document's entry in a postings table, without its positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DocHits {
    pub doc_id: DocId,
    pub num_positions: u32,
}

/// Doc id -> positions for a single word.
#[derive(Debug, Clone)]
pub struct PostingsReader {
    table: HashTableReader,
}

impl PostingsReader {
    pub fn open(file: Arc<File>, file_len: u64, offset: u64) -> Result<Self> {
        Ok(Self { table: HashTableReader::open(file, file_len, offset)? })
    }

    /// Where this postings table starts in the file.
    pub fn offset(&self) -> u64 {
        self.table.offset()
    }

    fn read_header(&self, pos: u64) -> Result<(DocId, usize)> {
        let header: PositionsElementHeader = read_record(self.table.file(), pos)?;
        Ok((header.doc_id, non_negative(header.num_positions, pos, "position count")?))
    }

    pub fn lookup_doc_id(&self, doc_id: DocId) -> Result<Option<Vec<Position>>> {
        for pos in self.table.lookup_element_positions(doc_id)? {
            let (stored, count) = self.read_header(pos)?;
            if stored != doc_id {
                continue;
            }
            let raw = self.table.read_span(
                pos + PositionsElementHeader::SIZE as u64,
                count,
                PositionRecord::SIZE,
                "positions",
            )?;
            let positions = raw
                .chunks_exact(PositionRecord::SIZE)
                .map(|c| PositionRecord::decode(c).position)
                .collect();
            return Ok(Some(positions));
        }
        Ok(None)
    }

    /// Every (doc id, position count) in the table, in on-disk order.
    pub fn doc_id_list(&self) -> Result<Vec<DocHits>> {
        self.table
            .all_element_positions()?
            .into_iter()
            .map(|pos| {
                let (doc_id, count) = self.read_header(pos)?;
                Ok(DocHits { doc_id, num_positions: count as u32 })
            })
            .collect()
    }
}
