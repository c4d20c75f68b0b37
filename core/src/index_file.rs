use crate::error::{IndexError, Result};
use crate::layout::{DiskRecord, FileHeader, MAGIC_NUMBER};
use crate::reader::{read_record, DocTableReader, WordTableReader};
use crate::writer::region_checksum;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opened, header-validated index file.
///
/// Hands out independent region readers; they share the underlying file
/// but not any cursor state.
#[derive(Debug, Clone)]
pub struct IndexFileReader {
    path: PathBuf,
    file: Arc<File>,
    header: FileHeader,
}

impl IndexFileReader {
    /// Opens `path` and checks, in order: the magic number, that the file
    /// length matches the header, and (if `validate`) the body checksum.
    pub fn open(path: impl AsRef<Path>, validate: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let actual = file.metadata()?.len();
        if actual < FileHeader::SIZE as u64 {
            return Err(IndexError::LengthMismatch { expected: FileHeader::SIZE as u64, actual });
        }

        let header: FileHeader = read_record(&file, 0)?;
        if header.magic != MAGIC_NUMBER {
            return Err(IndexError::BadMagic { found: header.magic });
        }

        let expected = header.expected_file_len();
        if actual != expected {
            return Err(IndexError::LengthMismatch { expected, actual });
        }

        if validate {
            let body_start = header.doctable_offset();
            let mut f = &file;
            f.seek(SeekFrom::Start(body_start))?;
            let computed = region_checksum(f, body_start, expected - body_start)?;
            if computed != header.checksum {
                return Err(IndexError::ChecksumMismatch { stored: header.checksum, computed });
            }
        }

        tracing::debug!(path = %path.display(), validate, "opened index file");
        Ok(Self { path: path.to_path_buf(), file: Arc::new(file), header })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn doc_table_reader(&self) -> Result<DocTableReader> {
        DocTableReader::open(Arc::clone(&self.file), self.header.expected_file_len(), self.header.doctable_offset())
    }

    pub fn word_table_reader(&self) -> Result<WordTableReader> {
        WordTableReader::open(Arc::clone(&self.file), self.header.expected_file_len(), self.header.index_offset())
    }
}
