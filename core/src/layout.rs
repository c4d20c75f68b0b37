//! Fixed on-disk record shapes.
//!
//! Every multi-byte field is stored big-endian ("network order") so an index
//! written on one machine reads back identically on any other. Records are
//! packed: there is no padding between fields.
//!
//! ```text
//! FileHeader       magic:u32 checksum:u32 doctable_bytes:u32 index_bytes:u32
//! Region           BucketListHeader{num_buckets:u32}
//!                  BucketRecord{chain_len:i32 chain_offset:u64} x num_buckets
//!                  per non-empty bucket:
//!                    ElementPositionRecord{elem_offset:u64} x chain_len
//!                    element x chain_len
//! DocElement       doc_id:u64 name_len:i16 + name bytes
//! WordElement      word_len:i16 nested_len:i32 + word bytes + nested Region
//! PositionsElement doc_id:u64 num_positions:i32 + position:u32 x num_positions
//! ```

/// Marks a completely written index file. Written last.
pub const MAGIC_NUMBER: u32 = 0xCAFE_F00D;

/// Largest record below; sizes stack buffers for reads.
pub const MAX_RECORD_SIZE: usize = 16;

/// A fixed-size record with a single on-disk byte layout.
pub trait DiskRecord: Sized {
    const SIZE: usize;

    /// Encodes into `buf`, which is exactly `SIZE` bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Decodes from `buf`, which is exactly `SIZE` bytes.
    fn decode(buf: &[u8]) -> Self;

    fn to_disk(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        self.encode(&mut buf);
        buf
    }
}

#[inline]
fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_be_bytes());
}

#[inline]
fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_be_bytes());
}

#[inline]
fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_be_bytes());
}

#[inline]
fn get_u16(buf: &[u8], at: usize) -> u16 {
    let mut b = [0u8; 2];
    b.copy_from_slice(&buf[at..at + 2]);
    u16::from_be_bytes(b)
}

#[inline]
fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_be_bytes(b)
}

#[inline]
fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_be_bytes(b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub checksum: u32,
    pub doctable_bytes: u32,
    pub index_bytes: u32,
}

impl FileHeader {
    /// Total file length this header declares.
    pub fn expected_file_len(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.doctable_bytes) + u64::from(self.index_bytes)
    }

    pub fn doctable_offset(&self) -> u64 {
        Self::SIZE as u64
    }

    pub fn index_offset(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.doctable_bytes)
    }
}

impl DiskRecord for FileHeader {
    const SIZE: usize = 16;

    fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.magic);
        put_u32(buf, 4, self.checksum);
        put_u32(buf, 8, self.doctable_bytes);
        put_u32(buf, 12, self.index_bytes);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            magic: get_u32(buf, 0),
            checksum: get_u32(buf, 4),
            doctable_bytes: get_u32(buf, 8),
            index_bytes: get_u32(buf, 12),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketListHeader {
    pub num_buckets: u32,
}

impl DiskRecord for BucketListHeader {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.num_buckets);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { num_buckets: get_u32(buf, 0) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRecord {
    pub chain_len: i32,
    pub chain_offset: u64,
}

impl DiskRecord for BucketRecord {
    const SIZE: usize = 12;

    fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.chain_len as u32);
        put_u64(buf, 4, self.chain_offset);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { chain_len: get_u32(buf, 0) as i32, chain_offset: get_u64(buf, 4) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementPositionRecord {
    pub elem_offset: u64,
}

impl DiskRecord for ElementPositionRecord {
    const SIZE: usize = 8;

    fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, 0, self.elem_offset);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { elem_offset: get_u64(buf, 0) }
    }
}

/// Fixed part of a document-table element; followed by `name_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocElementHeader {
    pub doc_id: u64,
    pub name_len: i16,
}

impl DiskRecord for DocElementHeader {
    const SIZE: usize = 10;

    fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, 0, self.doc_id);
        put_u16(buf, 8, self.name_len as u16);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { doc_id: get_u64(buf, 0), name_len: get_u16(buf, 8) as i16 }
    }
}

/// Fixed part of an inverted-index element; followed by the word bytes and
/// then a nested region of `nested_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordElementHeader {
    pub word_len: i16,
    pub nested_len: i32,
}

impl DiskRecord for WordElementHeader {
    const SIZE: usize = 6;

    fn encode(&self, buf: &mut [u8]) {
        put_u16(buf, 0, self.word_len as u16);
        put_u32(buf, 2, self.nested_len as u32);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { word_len: get_u16(buf, 0) as i16, nested_len: get_u32(buf, 2) as i32 }
    }
}

/// Fixed part of a postings element; followed by `num_positions` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionsElementHeader {
    pub doc_id: u64,
    pub num_positions: i32,
}

impl DiskRecord for PositionsElementHeader {
    const SIZE: usize = 12;

    fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, 0, self.doc_id);
        put_u32(buf, 8, self.num_positions as u32);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { doc_id: get_u64(buf, 0), num_positions: get_u32(buf, 8) as i32 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRecord {
    pub position: u32,
}

impl DiskRecord for PositionRecord {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.position);
    }

    fn decode(buf: &[u8]) -> Self {
        Self { position: get_u32(buf, 0) }
    }
}
